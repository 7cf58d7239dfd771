//! Soundtrack and track descriptors
//!
//! A soundtrack is an ordered list of stems ("tracks") of one musical
//! piece. Descriptors are plain data owned by the host's persistence
//! layer; the engine treats them as read-only once a soundtrack is bound
//! to live players.

use serde::{Deserialize, Serialize};

use crate::types::TrackRole;

/// Opaque soundtrack identity
///
/// Equality of ids is what the transport uses to decide whether a
/// `SetSoundtrack` swaps the active set (resetting master time) or merely
/// refreshes the current one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundtrackId(pub String);

impl std::fmt::Display for SoundtrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Descriptor for one stem of a soundtrack
///
/// `volume_percent` is the user-facing volume in -100..=100; the mapping
/// to linear gain lives in [`crate::mix::map_volume`]. The speed window
/// `[min_speed, max_speed]` (mph) is the range over which a dynamic
/// track ramps from silent to its mapped maximum. `min_speed ==
/// max_speed` marks an always-playing track; an inverted window is
/// malformed persisted data and resolves to "never audible" (the engine
/// never rejects it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Reference to the audio source (path or URL); resolved by the
    /// host's player factory, never opened by the engine itself
    pub source: String,
    /// Display name for UI and logs
    pub name: String,
    /// User volume in percent, -100.0..=100.0 (0 = unity gain)
    pub volume_percent: f32,
    /// Speed at which the track becomes audible (mph)
    pub min_speed: u32,
    /// Speed at which the track reaches full mapped volume (mph)
    pub max_speed: u32,
}

impl TrackDescriptor {
    /// Check for the always-playing configuration (empty speed window)
    #[inline]
    pub fn is_always_playing(&self) -> bool {
        self.min_speed == self.max_speed
    }
}

/// An ordered set of track descriptors with identity and display data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Soundtrack {
    pub id: SoundtrackId,
    pub title: String,
    /// Index 0 is the base track; everything after it is dynamic
    pub tracks: Vec<TrackDescriptor>,
    /// Artwork reference forwarded to the now-playing surface
    pub artwork: Option<String>,
}

impl Soundtrack {
    /// Role of the track at `index`
    pub fn role(&self, index: usize) -> TrackRole {
        TrackRole::from_index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(min: u32, max: u32) -> TrackDescriptor {
        TrackDescriptor {
            source: "drums.m4a".to_string(),
            name: "Drums".to_string(),
            volume_percent: 0.0,
            min_speed: min,
            max_speed: max,
        }
    }

    #[test]
    fn test_always_playing_window() {
        assert!(descriptor(10, 10).is_always_playing());
        assert!(!descriptor(10, 30).is_always_playing());
    }

    #[test]
    fn test_soundtrack_roles() {
        let soundtrack = Soundtrack {
            id: SoundtrackId("st-1".to_string()),
            title: "Night Ride".to_string(),
            tracks: vec![descriptor(0, 0), descriptor(5, 25)],
            artwork: None,
        };
        assert_eq!(soundtrack.role(0), TrackRole::Base);
        assert_eq!(soundtrack.role(1), TrackRole::Dynamic);
    }

    #[test]
    fn test_descriptor_yaml_roundtrip() {
        let yaml = serde_yaml::to_string(&descriptor(5, 25)).unwrap();
        let back: TrackDescriptor = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.min_speed, 5);
        assert_eq!(back.max_speed, 25);
        assert_eq!(back.name, "Drums");
    }
}
