//! Lanes - the bound form of a soundtrack
//!
//! Activating a soundtrack binds each descriptor to a live player; the
//! result is one [`Lane`] record per track holding descriptor, player
//! handle, current gain, and fade bookkeeping together. Keeping these in
//! a single array of records (instead of index-aligned parallel
//! collections) is what rules out index-desync bugs between players and
//! descriptors.

use std::time::Duration;

use crate::mix::FadeRamp;
use crate::player::StemPlayer;
use crate::soundtrack::{Soundtrack, SoundtrackId, TrackDescriptor};
use crate::types::{Gain, TrackRole};

use super::sched::TaskId;

/// One track of the active soundtrack, bound to its player
///
/// `player == None` means the source was missing or unloadable at bind
/// time; the lane is carried (so indices still mirror the soundtrack)
/// but excluded from every start/stop/resync/volume operation.
pub struct Lane {
    pub descriptor: TrackDescriptor,
    pub role: TrackRole,
    pub player: Option<Box<dyn StemPlayer>>,
    /// Gain the lane currently sits at (mirrors the player)
    pub gain: Gain,
    /// In-flight fade, if any
    pub(crate) fade: Option<FadeRamp>,
    /// Scheduler token for the fade's step series
    pub(crate) fade_task: Option<TaskId>,
}

impl Lane {
    pub fn bound(
        descriptor: TrackDescriptor,
        role: TrackRole,
        player: Box<dyn StemPlayer>,
    ) -> Self {
        Self {
            descriptor,
            role,
            player: Some(player),
            gain: 0.0,
            fade: None,
            fade_task: None,
        }
    }

    /// Lane for a track whose source could not be bound
    pub fn unbound(descriptor: TrackDescriptor, role: TrackRole) -> Self {
        Self {
            descriptor,
            role,
            player: None,
            gain: 0.0,
            fade: None,
            fade_task: None,
        }
    }

    /// Whether this lane's player is currently producing audio
    #[inline]
    pub fn is_sounding(&self) -> bool {
        self.player.as_ref().is_some_and(|p| p.is_sounding())
    }
}

impl std::fmt::Debug for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lane")
            .field("name", &self.descriptor.name)
            .field("role", &self.role)
            .field("bound", &self.player.is_some())
            .field("gain", &self.gain)
            .finish()
    }
}

/// A soundtrack bound to live players - the engine's active set
///
/// Exactly one of these is current at any time; all other soundtracks
/// exist only as stored descriptor data with no live players.
pub struct ActiveSoundtrack {
    pub soundtrack: Soundtrack,
    pub lanes: Vec<Lane>,
}

impl ActiveSoundtrack {
    pub fn id(&self) -> &SoundtrackId {
        &self.soundtrack.id
    }

    /// Soundtrack length: the longest bound stem
    pub fn duration(&self) -> Option<Duration> {
        self.lanes
            .iter()
            .filter_map(|l| l.player.as_ref().and_then(|p| p.duration()))
            .max()
    }
}

impl std::fmt::Debug for ActiveSoundtrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSoundtrack")
            .field("id", &self.soundtrack.id)
            .field("lanes", &self.lanes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::sim::{SimClock, SimPlayer};

    fn descriptor(name: &str) -> TrackDescriptor {
        TrackDescriptor {
            source: format!("{name}.m4a"),
            name: name.to_string(),
            volume_percent: 0.0,
            min_speed: 0,
            max_speed: 20,
        }
    }

    #[test]
    fn test_unbound_lane_never_sounds() {
        let lane = Lane::unbound(descriptor("ghost"), TrackRole::Dynamic);
        assert!(!lane.is_sounding());
        assert!(lane.player.is_none());
    }

    #[test]
    fn test_duration_is_longest_bound_stem() {
        let clock = SimClock::new();
        let soundtrack = Soundtrack {
            id: SoundtrackId("st".to_string()),
            title: "T".to_string(),
            tracks: vec![],
            artwork: None,
        };
        let active = ActiveSoundtrack {
            soundtrack,
            lanes: vec![
                Lane::bound(
                    descriptor("a"),
                    TrackRole::Base,
                    Box::new(SimPlayer::new(Duration::from_secs(180), clock.clone())),
                ),
                Lane::bound(
                    descriptor("b"),
                    TrackRole::Dynamic,
                    Box::new(SimPlayer::new(Duration::from_secs(200), clock.clone())),
                ),
                Lane::unbound(descriptor("c"), TrackRole::Dynamic),
            ],
        };
        assert_eq!(active.duration(), Some(Duration::from_secs(200)));
    }
}
