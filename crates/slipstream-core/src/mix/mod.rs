//! Speed-to-volume mapping
//!
//! Pure functions converting a user volume percentage and a live speed
//! sample into the linear gain a stem player should sit at. No state
//! lives here; the transport asks for targets and schedules fades
//! toward them ([`FadeRamp`]).

mod fade;

pub use fade::FadeRamp;

use crate::soundtrack::TrackDescriptor;
use crate::types::{Gain, Mph, TrackRole, MAX_GAIN};

/// Map a user volume percentage to a linear gain
///
/// -100% is silent, 0% is unity, +100% is a 2x boost. Out-of-range input
/// (stale persisted data) clamps instead of erroring.
#[inline]
pub fn map_volume(percent: f32) -> Gain {
    ((percent + 100.0) / 100.0).clamp(0.0, MAX_GAIN)
}

/// Gain a track should sit at for the given speed while its soundtrack
/// is playing
///
/// The base track ignores speed entirely. A dynamic track with an empty
/// speed window (min == max) behaves like a base track by user choice.
/// Otherwise the gain ramps linearly from 0 at `min_speed` up to the
/// mapped maximum at `max_speed`, clamped at both ends. An inverted
/// window resolves to silence rather than an error so that malformed
/// persisted data cannot take the mix down.
pub fn target_gain(descriptor: &TrackDescriptor, role: TrackRole, speed: Mph) -> Gain {
    let max_gain = map_volume(descriptor.volume_percent);

    if role == TrackRole::Base || descriptor.is_always_playing() {
        return max_gain;
    }
    if descriptor.min_speed > descriptor.max_speed {
        // Malformed window: never audible
        return 0.0;
    }

    let min = descriptor.min_speed as f32;
    let max = descriptor.max_speed as f32;
    if speed < min {
        0.0
    } else if speed >= max {
        max_gain
    } else {
        max_gain * (speed - min) / (max - min)
    }
}
