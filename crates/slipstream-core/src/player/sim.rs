//! Simulated stem players
//!
//! [`SimPlayer`] models a host audio player with its own autonomous
//! clock: a shared [`SimClock`] stands in for the audio subsystem's
//! timeline, advanced explicitly by tests and by the ride-replay
//! harness. Everything is deterministic; no threads, no sleeps.
//!
//! The simulation honors the contract details the engine depends on:
//! a start lead (not sounding until the deadline passes), indefinite
//! looping wrap at the source duration, and seeks that re-anchor the
//! cursor without interrupting playback. [`SimDrift`] skews a cursor to
//! emulate the clock divergence the resync tick exists to correct.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{PlayerError, PlayerFactory, PlayerResult, StemPlayer};
use crate::soundtrack::TrackDescriptor;
use crate::types::{Gain, UNITY_GAIN};

/// Shared monotonic clock standing in for the host audio subsystem
///
/// Stored as microseconds so readers on any thread see a consistent
/// value without locking.
#[derive(Debug, Default)]
pub struct SimClock {
    micros: AtomicU64,
}

impl SimClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Current simulated time
    pub fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::Relaxed))
    }

    /// Advance the clock by `delta`
    pub fn advance(&self, delta: Duration) {
        self.micros
            .fetch_add(delta.as_micros() as u64, Ordering::Relaxed);
    }
}

/// Internal playback state of a simulated player
#[derive(Debug, Clone, Copy)]
enum SimState {
    /// Not producing audio; cursor frozen
    Stopped { cursor: Duration },
    /// Start requested; becomes audible once the deadline passes
    Scheduled { deadline: Duration, cursor: Duration },
    /// Producing audio; cursor = position + (now - anchor)
    Running { anchor: Duration, position: Duration },
}

/// Handle for skewing a [`SimPlayer`]'s cursor from outside
///
/// Emulates the independent-output drift that accumulates over minutes
/// of real playback; the engine's resync tick must pull the cursor back
/// to the reference track. The handle stays valid after the player is
/// boxed behind the `StemPlayer` trait.
#[derive(Debug, Clone, Default)]
pub struct SimDrift {
    micros: Arc<AtomicU64>,
}

impl SimDrift {
    /// Push the player's cursor `ahead` of its siblings
    pub fn drift(&self, ahead: Duration) {
        self.micros
            .fetch_add(ahead.as_micros() as u64, Ordering::Relaxed);
    }

    fn take_on_reanchor(&self) {
        self.micros.store(0, Ordering::Relaxed);
    }

    fn current(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::Relaxed))
    }
}

/// Deterministic stem player driven by a [`SimClock`]
pub struct SimPlayer {
    clock: Arc<SimClock>,
    duration: Duration,
    state: SimState,
    looping: bool,
    gain: Gain,
    /// Artificial clock skew, added to the computed cursor
    skew: SimDrift,
}

impl SimPlayer {
    pub fn new(duration: Duration, clock: Arc<SimClock>) -> Self {
        Self {
            clock,
            duration,
            state: SimState::Stopped {
                cursor: Duration::ZERO,
            },
            looping: false,
            gain: UNITY_GAIN,
            skew: SimDrift::default(),
        }
    }

    /// Handle that can skew this player's cursor after it is boxed
    pub fn drift_handle(&self) -> SimDrift {
        self.skew.clone()
    }

    fn wrap(&self, raw: Duration) -> Duration {
        if self.duration.is_zero() {
            return Duration::ZERO;
        }
        if self.looping {
            Duration::from_nanos((raw.as_nanos() % self.duration.as_nanos()) as u64)
        } else {
            raw.min(self.duration)
        }
    }
}

impl StemPlayer for SimPlayer {
    fn start(&mut self, position: Duration, lead: Duration) {
        self.state = SimState::Scheduled {
            deadline: self.clock.now() + lead,
            cursor: position,
        };
    }

    fn stop(&mut self) {
        let cursor = self.position();
        self.state = SimState::Stopped { cursor };
        self.skew.take_on_reanchor();
    }

    fn is_sounding(&self) -> bool {
        match self.state {
            SimState::Stopped { .. } => false,
            SimState::Scheduled { deadline, .. } => self.clock.now() >= deadline,
            SimState::Running { .. } => true,
        }
    }

    fn position(&self) -> Duration {
        let now = self.clock.now();
        let raw = match self.state {
            SimState::Stopped { cursor } => return cursor,
            SimState::Scheduled { deadline, cursor } => {
                if now < deadline {
                    cursor
                } else {
                    cursor + (now - deadline) + self.skew.current()
                }
            }
            SimState::Running { anchor, position } => {
                position + (now - anchor) + self.skew.current()
            }
        };
        self.wrap(raw)
    }

    fn seek(&mut self, position: Duration) {
        let now = self.clock.now();
        self.skew.take_on_reanchor();
        self.state = match self.state {
            SimState::Stopped { .. } => SimState::Stopped { cursor: position },
            SimState::Scheduled { deadline, .. } if now < deadline => SimState::Scheduled {
                deadline,
                cursor: position,
            },
            // Sounding (scheduled past deadline or running): re-anchor
            // the cursor in place, playback never stops
            _ => SimState::Running {
                anchor: now,
                position,
            },
        };
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_gain(&mut self, gain: Gain) {
        self.gain = gain;
    }

    fn gain(&self) -> Gain {
        self.gain
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }
}

/// Factory producing [`SimPlayer`]s from a table of known sources
///
/// Sources absent from the table bind as missing, exercising the
/// degraded-lane path end to end.
pub struct SimPlayerFactory {
    clock: Arc<SimClock>,
    sources: HashMap<String, Duration>,
}

impl SimPlayerFactory {
    pub fn new(clock: Arc<SimClock>) -> Self {
        Self {
            clock,
            sources: HashMap::new(),
        }
    }

    /// Register a source reference and the duration of its audio
    pub fn with_source(mut self, source: impl Into<String>, duration: Duration) -> Self {
        self.sources.insert(source.into(), duration);
        self
    }

    /// Shared clock the produced players run on
    pub fn clock(&self) -> Arc<SimClock> {
        self.clock.clone()
    }
}

impl PlayerFactory for SimPlayerFactory {
    fn bind(&self, descriptor: &TrackDescriptor) -> PlayerResult<Box<dyn StemPlayer>> {
        let duration = self
            .sources
            .get(&descriptor.source)
            .ok_or_else(|| PlayerError::SourceMissing(descriptor.source.clone()))?;
        Ok(Box::new(SimPlayer::new(*duration, self.clock.clone())))
    }
}
