//! Now-playing surface contract
//!
//! Mirrors transport state out to whatever media-control chrome the host
//! runs (lock screen, desktop widget, headless log) and names the inbound
//! remote commands the host must forward into the transport. The engine
//! only ever talks to the [`NowPlayingPublisher`] trait; real OS
//! integrations live outside this crate.

use std::time::Duration;

use crate::types::Mph;

/// Outbound snapshot of what is currently playing
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingState {
    /// Soundtrack title
    pub title: String,
    /// Short status line derived from the current speed
    pub status_text: String,
    /// Master playback time
    pub elapsed: Duration,
    /// Soundtrack length (longest bound stem), when known
    pub duration: Option<Duration>,
    /// Artwork reference for the media surface
    pub artwork: Option<String>,
    pub playing: bool,
}

impl NowPlayingState {
    /// Status line shown next to the title, e.g. "23.4 mph"
    pub fn status_for_speed(speed: Mph) -> String {
        format!("{speed:.1} mph")
    }
}

/// Remote transport commands arriving from the media surface
///
/// Each maps onto the transport's `toggle()` guarded by current state: a
/// `Play` while already playing is a no-op, and vice versa for `Pause`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCommand {
    Play,
    Pause,
    Toggle,
}

/// Sink for outbound now-playing state
pub trait NowPlayingPublisher: Send {
    /// Push a fresh snapshot to the media surface
    fn publish(&mut self, state: &NowPlayingState);

    /// Clear the surface (nothing is playing)
    fn clear(&mut self);
}

/// Publisher that mirrors state into the log, used by headless harnesses
#[derive(Debug, Default)]
pub struct LogPublisher;

impl NowPlayingPublisher for LogPublisher {
    fn publish(&mut self, state: &NowPlayingState) {
        log::info!(
            "now playing: {} [{}] {:.1}s{} {}",
            state.title,
            state.status_text,
            state.elapsed.as_secs_f32(),
            state
                .duration
                .map(|d| format!(" / {:.1}s", d.as_secs_f32()))
                .unwrap_or_default(),
            if state.playing { "▶" } else { "⏸" },
        );
    }

    fn clear(&mut self) {
        log::info!("now playing: cleared");
    }
}

/// Publisher that drops everything, for tests and embedded use
#[derive(Debug, Default)]
pub struct NoopPublisher;

impl NowPlayingPublisher for NoopPublisher {
    fn publish(&mut self, _state: &NowPlayingState) {}
    fn clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_formatting() {
        assert_eq!(NowPlayingState::status_for_speed(23.44), "23.4 mph");
        assert_eq!(NowPlayingState::status_for_speed(0.0), "0.0 mph");
    }
}
