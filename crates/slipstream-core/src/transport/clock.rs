//! Master playback time and drift correction
//!
//! Each bound player advances its cursor on the host audio subsystem's
//! own clock, so multiple independently driven outputs will not stay
//! sample-accurate over minutes of playback. While playing, the engine
//! runs a high-frequency resync tick: read the first sounding track's
//! cursor as the authoritative master time, then force every other
//! sounding track's cursor to it with a direct position write (never a
//! stop/restart, which clicks audibly).

use std::time::Duration;

use super::lane::Lane;

/// The single authoritative elapsed-time value all tracks are kept
/// consistent with
#[derive(Debug, Default)]
pub struct PlaybackClock {
    master: Duration,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current master playback time
    #[inline]
    pub fn master(&self) -> Duration {
        self.master
    }

    /// Reset to zero (soundtrack identity changed or rewind)
    pub fn reset(&mut self) {
        self.master = Duration::ZERO;
    }

    /// One drift-correction tick
    ///
    /// The reference track is the first lane currently sounding; its
    /// cursor becomes the master time and every other sounding lane is
    /// snapped to it. With nothing sounding the tick is a no-op and the
    /// master value holds. Returns whether a reference was found.
    pub fn resync(&mut self, lanes: &mut [Lane]) -> bool {
        let Some(reference) = lanes.iter().position(|l| l.is_sounding()) else {
            return false;
        };

        // Split so the reference cursor can be read while others are
        // written; the reference itself is never repositioned.
        self.master = lanes[reference]
            .player
            .as_ref()
            .map(|p| p.position())
            .unwrap_or_default();

        for (idx, lane) in lanes.iter_mut().enumerate() {
            if idx == reference || !lane.is_sounding() {
                continue;
            }
            if let Some(player) = lane.player.as_mut() {
                player.seek(self.master);
            }
        }
        true
    }

    /// Capture the master time from the sounding reference without
    /// repositioning anyone (used on the transition to Stopped)
    pub fn capture(&mut self, lanes: &[Lane]) {
        if let Some(reference) = lanes.iter().find(|l| l.is_sounding()) {
            if let Some(player) = reference.player.as_ref() {
                self.master = player.position();
            }
        }
    }
}
