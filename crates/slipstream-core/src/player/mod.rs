//! The stem-player seam
//!
//! The engine never decodes or outputs audio; each stem is driven through
//! an opaque [`StemPlayer`] bound once per soundtrack activation. The
//! host supplies real players (platform audio APIs) through a
//! [`PlayerFactory`]; the crate ships a deterministic simulated player
//! for tests and the ride-replay harness.

mod error;
pub mod sim;

pub use error::{PlayerError, PlayerResult};

use std::time::Duration;

use crate::soundtrack::TrackDescriptor;
use crate::types::Gain;

/// One independently clocked audio player bound to a single stem
///
/// Start/stop calls are fire-and-forget against the host audio layer and
/// must not block. `seek` is a direct cursor write while playback
/// continues; it must never stop and restart the player (restarting
/// causes audible clicks, which is why drift correction uses it).
pub trait StemPlayer: Send {
    /// Begin playback with the cursor at `position`, starting `lead`
    /// in the future so sibling players can be launched in lock-step
    fn start(&mut self, position: Duration, lead: Duration);

    /// Stop playback, freezing the cursor where it was
    fn stop(&mut self);

    /// Whether the player is currently producing audio
    fn is_sounding(&self) -> bool;

    /// Current play cursor
    fn position(&self) -> Duration;

    /// Direct cursor write without interrupting playback
    fn seek(&mut self, position: Duration);

    /// Loop indefinitely instead of stopping at the end of the source
    fn set_looping(&mut self, looping: bool);

    /// Apply a linear gain
    fn set_gain(&mut self, gain: Gain);

    /// Gain the player currently sits at
    fn gain(&self) -> Gain;

    /// Length of the underlying source, when the host knows it
    fn duration(&self) -> Option<Duration>;
}

/// Resolves a track descriptor's source into a live player
///
/// A factory failure for one track is non-fatal: the loader degrades
/// that track to an unbound lane and the rest of the soundtrack stays
/// playable.
pub trait PlayerFactory: Send + Sync {
    fn bind(&self, descriptor: &TrackDescriptor) -> PlayerResult<Box<dyn StemPlayer>>;
}
