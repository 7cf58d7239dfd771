//! Lock-free transport state for UI access
//!
//! The owner thread writes these atomics whenever transport state
//! changes; any other thread (UI, media surface glue, harnesses) reads
//! them without taking a lock. All operations use `Ordering::Relaxed`
//! since readers only need visibility, not synchronization with other
//! memory.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use crate::types::Mph;

/// Mirror of the transport state readable from any thread
#[derive(Debug, Default)]
pub struct TransportAtomics {
    /// Whether the engine is in the Playing state
    playing: AtomicBool,
    /// Master playback time in milliseconds
    master_time_ms: AtomicU64,
    /// Last known speed in tenths of a mph
    speed_tenths: AtomicU32,
    /// Bumped every time the active soundtrack identity changes
    soundtrack_serial: AtomicU64,
}

impl TransportAtomics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn master_time(&self) -> Duration {
        Duration::from_millis(self.master_time_ms.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn speed(&self) -> Mph {
        self.speed_tenths.load(Ordering::Relaxed) as f32 / 10.0
    }

    /// Serial of the active soundtrack; changes mean "re-read titles"
    #[inline]
    pub fn soundtrack_serial(&self) -> u64 {
        self.soundtrack_serial.load(Ordering::Relaxed)
    }

    pub(crate) fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Relaxed);
    }

    pub(crate) fn set_master_time(&self, time: Duration) {
        self.master_time_ms
            .store(time.as_millis() as u64, Ordering::Relaxed);
    }

    pub(crate) fn set_speed(&self, speed: Mph) {
        self.speed_tenths
            .store((speed.max(0.0) * 10.0).round() as u32, Ordering::Relaxed);
    }

    pub(crate) fn bump_soundtrack_serial(&self) {
        self.soundtrack_serial.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomics_roundtrip() {
        let atomics = TransportAtomics::new();
        assert!(!atomics.is_playing());

        atomics.set_playing(true);
        atomics.set_master_time(Duration::from_millis(4_200));
        atomics.set_speed(23.44);
        atomics.bump_soundtrack_serial();

        assert!(atomics.is_playing());
        assert_eq!(atomics.master_time(), Duration::from_millis(4_200));
        assert!((atomics.speed() - 23.4).abs() < 0.05);
        assert_eq!(atomics.soundtrack_serial(), 1);
    }

    #[test]
    fn test_negative_speed_clamps_to_zero() {
        let atomics = TransportAtomics::new();
        atomics.set_speed(-3.0);
        assert_eq!(atomics.speed(), 0.0);
    }
}
