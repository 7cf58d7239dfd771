//! Ride replay configuration
//!
//! A ride file describes one soundtrack (stem descriptors plus the
//! durations the simulated players should report) and a recorded speed
//! trace to replay against it. Stored as YAML next to the engine config;
//! a missing file falls back to the built-in demo ride so the binary
//! runs out of the box.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use slipstream_core::config::EngineConfig;
use slipstream_core::player::sim::{SimClock, SimPlayerFactory};
use slipstream_core::soundtrack::{Soundtrack, SoundtrackId, TrackDescriptor};

/// One stem of the replayed soundtrack
///
/// Index 0 is the base stem. `duration_s` is what the simulated player
/// reports as its source length; real deployments get this from the
/// decoded audio instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideStem {
    pub source: String,
    pub name: String,
    pub volume_percent: f32,
    pub min_speed: u32,
    pub max_speed: u32,
    pub duration_s: f32,
}

/// One point of the recorded speed trace
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TracePoint {
    /// Seconds into the ride
    pub at_s: f32,
    pub mph: f32,
}

/// Full ride description
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RideConfig {
    pub title: String,
    pub stems: Vec<RideStem>,
    pub trace: Vec<TracePoint>,
    /// Replay step in milliseconds
    pub tick_ms: u64,
    /// Seconds to keep playing after the last trace point
    pub tail_s: f32,
    pub engine: EngineConfig,
}

impl Default for RideConfig {
    fn default() -> Self {
        // Built-in demo: a short climb to cruising speed and back down
        Self {
            title: "Coastal Loop".to_string(),
            stems: vec![
                RideStem {
                    source: "foundation.m4a".to_string(),
                    name: "Foundation".to_string(),
                    volume_percent: 0.0,
                    min_speed: 0,
                    max_speed: 0,
                    duration_s: 240.0,
                },
                RideStem {
                    source: "drums.m4a".to_string(),
                    name: "Drums".to_string(),
                    volume_percent: 0.0,
                    min_speed: 3,
                    max_speed: 12,
                    duration_s: 240.0,
                },
                RideStem {
                    source: "bass.m4a".to_string(),
                    name: "Bass".to_string(),
                    volume_percent: -10.0,
                    min_speed: 8,
                    max_speed: 20,
                    duration_s: 240.0,
                },
                RideStem {
                    source: "synths.m4a".to_string(),
                    name: "Synths".to_string(),
                    volume_percent: 25.0,
                    min_speed: 15,
                    max_speed: 30,
                    duration_s: 240.0,
                },
            ],
            trace: vec![
                TracePoint { at_s: 0.0, mph: 0.0 },
                TracePoint { at_s: 4.0, mph: 5.0 },
                TracePoint { at_s: 8.0, mph: 11.0 },
                TracePoint { at_s: 14.0, mph: 18.0 },
                TracePoint { at_s: 20.0, mph: 26.0 },
                TracePoint { at_s: 30.0, mph: 31.0 },
                TracePoint { at_s: 40.0, mph: 22.0 },
                TracePoint { at_s: 48.0, mph: 12.0 },
                TracePoint { at_s: 55.0, mph: 4.0 },
                TracePoint { at_s: 60.0, mph: 0.0 },
            ],
            tick_ms: 50,
            tail_s: 3.0,
            engine: EngineConfig::default(),
        }
    }
}

impl RideConfig {
    /// Descriptors for the engine, in stem order
    pub fn soundtrack(&self) -> Soundtrack {
        Soundtrack {
            id: SoundtrackId(self.title.to_lowercase().replace(' ', "-")),
            title: self.title.clone(),
            tracks: self
                .stems
                .iter()
                .map(|stem| TrackDescriptor {
                    source: stem.source.clone(),
                    name: stem.name.clone(),
                    volume_percent: stem.volume_percent,
                    min_speed: stem.min_speed,
                    max_speed: stem.max_speed,
                })
                .collect(),
            artwork: None,
        }
    }

    /// Simulated player factory knowing every stem source
    pub fn player_factory(&self, clock: std::sync::Arc<SimClock>) -> SimPlayerFactory {
        self.stems.iter().fold(
            SimPlayerFactory::new(clock),
            |factory, stem| {
                factory.with_source(
                    stem.source.clone(),
                    Duration::from_secs_f32(stem.duration_s.max(0.0)),
                )
            },
        )
    }

    /// Total wall time the replay runs for
    pub fn ride_length(&self) -> Duration {
        let last = self.trace.last().map(|p| p.at_s).unwrap_or(0.0);
        Duration::from_secs_f32((last + self.tail_s).max(0.0))
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// Default location of the ride file
pub fn default_ride_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("slipstream")
        .join("ride.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_ride_is_coherent() {
        let config = RideConfig::default();
        assert!(!config.stems.is_empty());
        assert!(config.trace.windows(2).all(|w| w[0].at_s <= w[1].at_s));

        let soundtrack = config.soundtrack();
        assert_eq!(soundtrack.tracks.len(), config.stems.len());
        // The demo's base stem is always-playing
        assert!(soundtrack.tracks[0].is_always_playing());
    }

    #[test]
    fn test_every_demo_stem_binds() {
        use slipstream_core::player::PlayerFactory;

        let config = RideConfig::default();
        let factory = config.player_factory(SimClock::new());
        for track in &config.soundtrack().tracks {
            assert!(
                factory.bind(track).is_ok(),
                "stem {} did not bind",
                track.name
            );
        }
    }

    #[test]
    fn test_ride_length_includes_tail() {
        let config = RideConfig::default();
        assert_eq!(config.ride_length(), Duration::from_secs_f32(63.0));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = RideConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: RideConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.title, config.title);
        assert_eq!(back.stems.len(), config.stems.len());
        assert_eq!(back.engine, config.engine);
    }
}
