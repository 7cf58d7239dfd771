//! Soundtrack binding boundary
//!
//! The persistence layer hands the engine fully-populated soundtrack
//! descriptors; binding resolves each track's source into a live player
//! through the host's [`PlayerFactory`]. One failing track degrades to
//! an unbound lane and never aborts the rest of the soundtrack.
//!
//! Background loads deliver their result through a oneshot channel
//! returned to the specific caller that asked - deliberately not a
//! global notification anyone can observe. The caller forwards the
//! bound set into the engine as a `SetSoundtrack` command when it
//! arrives.

use std::sync::Arc;
use std::thread;

use tokio::sync::oneshot;

use crate::player::PlayerFactory;
use crate::soundtrack::Soundtrack;
use crate::transport::{ActiveSoundtrack, Lane};
use crate::types::TrackRole;

/// Bind every track of a soundtrack to a player
///
/// Tracks whose source cannot be resolved are carried as unbound lanes,
/// excluded from playback operations, with lane indices still mirroring
/// the descriptor order.
pub fn bind_soundtrack(factory: &dyn PlayerFactory, soundtrack: Soundtrack) -> ActiveSoundtrack {
    let lanes = soundtrack
        .tracks
        .iter()
        .enumerate()
        .map(|(index, descriptor)| {
            let role = TrackRole::from_index(index);
            match factory.bind(descriptor) {
                Ok(player) => Lane::bound(descriptor.clone(), role, player),
                Err(e) => {
                    log::warn!(
                        "excluding track '{}' of {} from playback: {}",
                        descriptor.name,
                        soundtrack.id,
                        e
                    );
                    Lane::unbound(descriptor.clone(), role)
                }
            }
        })
        .collect();

    ActiveSoundtrack { soundtrack, lanes }
}

/// Bind a soundtrack on a background thread
///
/// Returns immediately with the receiving end of a oneshot channel; the
/// bound set arrives once every track has been resolved. Dropping the
/// receiver abandons the load.
pub fn load_soundtrack(
    factory: Arc<dyn PlayerFactory>,
    soundtrack: Soundtrack,
) -> oneshot::Receiver<ActiveSoundtrack> {
    let (tx, rx) = oneshot::channel();
    thread::Builder::new()
        .name("slipstream-loader".to_string())
        .spawn(move || {
            let active = bind_soundtrack(factory.as_ref(), soundtrack);
            if tx.send(active).is_err() {
                log::debug!("soundtrack load result dropped: requester went away");
            }
        })
        .expect("Failed to spawn loader thread");
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::sim::{SimClock, SimPlayerFactory};
    use crate::soundtrack::{SoundtrackId, TrackDescriptor};
    use std::time::Duration;

    fn descriptor(source: &str) -> TrackDescriptor {
        TrackDescriptor {
            source: source.to_string(),
            name: source.trim_end_matches(".m4a").to_string(),
            volume_percent: 0.0,
            min_speed: 0,
            max_speed: 20,
        }
    }

    fn soundtrack(sources: &[&str]) -> Soundtrack {
        Soundtrack {
            id: SoundtrackId("st".to_string()),
            title: "Test".to_string(),
            tracks: sources.iter().map(|s| descriptor(s)).collect(),
            artwork: None,
        }
    }

    #[test]
    fn test_missing_source_degrades_to_unbound_lane() {
        let factory = SimPlayerFactory::new(SimClock::new())
            .with_source("base.m4a", Duration::from_secs(60))
            .with_source("bass.m4a", Duration::from_secs(60));

        let active = bind_soundtrack(&factory, soundtrack(&["base.m4a", "gone.m4a", "bass.m4a"]));

        assert_eq!(active.lanes.len(), 3);
        assert!(active.lanes[0].player.is_some());
        assert!(active.lanes[1].player.is_none());
        assert!(active.lanes[2].player.is_some());
        // Indices still mirror descriptor order
        assert_eq!(active.lanes[2].descriptor.source, "bass.m4a");
    }

    #[test]
    fn test_background_load_delivers_to_requester() {
        let factory: Arc<dyn PlayerFactory> = Arc::new(
            SimPlayerFactory::new(SimClock::new())
                .with_source("base.m4a", Duration::from_secs(60)),
        );

        let rx = load_soundtrack(factory, soundtrack(&["base.m4a"]));
        let active = rx.blocking_recv().expect("loader thread dropped");
        assert_eq!(active.lanes.len(), 1);
        assert!(active.lanes[0].player.is_some());
    }
}
