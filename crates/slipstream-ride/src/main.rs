//! Slipstream Ride - headless speed-trace replay
//!
//! Drives the full engine end to end without any UI or audio hardware:
//! binds simulated stem players, starts the transport, feeds a recorded
//! speed trace in real time, and logs the evolving mix. Useful both as
//! a demo and as a soak harness for the synchronization core.
//!
//! ## Usage
//!
//! `slipstream-ride [ride.yaml]` - with no argument, the ride file is
//! read from the user config directory and the built-in demo ride is
//! used when none exists.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use slipstream_core::config::load_config;
use slipstream_core::loader::load_soundtrack;
use slipstream_core::nowplaying::{LogPublisher, MediaCommand};
use slipstream_core::player::PlayerFactory;
use slipstream_core::transport::{start_engine, TransportCommand};

use config::{default_ride_path, RideConfig};

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_ride_path);
    let ride: RideConfig = load_config(&path);
    log::info!(
        "replaying '{}': {} stems, {} trace points, {:.0}s",
        ride.title,
        ride.stems.len(),
        ride.trace.len(),
        ride.ride_length().as_secs_f32()
    );

    // The sim clock stands in for the host audio subsystem's timeline;
    // the replay loop advances it in step with wall time
    let factory = ride.player_factory(slipstream_core::player::sim::SimClock::new());
    let clock = factory.clock();

    // Bind on the loader thread; the oneshot comes back to us alone
    let factory: Arc<dyn PlayerFactory> = Arc::new(factory);
    let soundtrack = ride.soundtrack();
    let bound = load_soundtrack(factory, soundtrack)
        .blocking_recv()
        .context("soundtrack loader thread dropped")?;
    let playable = bound.lanes.iter().filter(|l| l.player.is_some()).count();
    log::info!("bound {}/{} stems", playable, bound.lanes.len());

    let mut engine = start_engine(ride.engine.clone(), Box::new(LogPublisher));
    let atomics = engine.atomics();
    engine.send(TransportCommand::SetSoundtrack(Box::new(bound)));
    engine.send(TransportCommand::Toggle);

    let tick = ride.tick();
    let length = ride.ride_length();
    let started = Instant::now();
    let mut trace = ride.trace.iter().peekable();
    let mut last_report = Duration::ZERO;

    while started.elapsed() < length {
        thread::sleep(tick);
        clock.advance(tick);

        let elapsed = started.elapsed();
        while let Some(&&point) = trace.peek() {
            if Duration::from_secs_f32(point.at_s.max(0.0)) > elapsed {
                break;
            }
            trace.next();
            engine.send(TransportCommand::Speed(point.mph));
        }

        if elapsed >= last_report + Duration::from_secs(5) {
            last_report = elapsed;
            log::info!(
                "t={:>3.0}s speed={:>5.1} mph master={:>6.1}s",
                elapsed.as_secs_f32(),
                atomics.speed(),
                atomics.master_time().as_secs_f32()
            );
        }
    }

    // End of the ride: pause through the media surface path so the
    // state guard gets exercised too
    engine.send(TransportCommand::Media(MediaCommand::Pause));
    thread::sleep(Duration::from_millis(50));
    log::info!(
        "ride finished at master={:.1}s, playing={}",
        atomics.master_time().as_secs_f32(),
        atomics.is_playing()
    );

    engine.shutdown();
    Ok(())
}
