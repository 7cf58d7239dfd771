//! Engine owner thread
//!
//! Spawns the single thread that owns the [`TransportController`] and
//! serializes every mutation onto it: queued commands are drained at
//! each pass, then due scheduler work runs. While playing, the loop
//! paces itself at the resync cadence; idle, it relaxes to a slow poll.
//!
//! The handle side is what the host application keeps: a wait-free
//! command producer plus the shared atomics for lock-free state reads.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::nowplaying::NowPlayingPublisher;

use super::atomics::TransportAtomics;
use super::command::{command_channel, TransportCommand};
use super::controller::TransportController;

/// Poll interval when nothing is scheduled (engine stopped)
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Handle to a running engine
///
/// Dropping the handle shuts the owner thread down.
pub struct EngineHandle {
    commands: rtrb::Producer<TransportCommand>,
    atomics: Arc<TransportAtomics>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Queue a command for the owner thread
    ///
    /// Returns false if the queue is full (the command is dropped with
    /// a warning; the engine is wedged or the producer is flooding).
    pub fn send(&mut self, command: TransportCommand) -> bool {
        match self.commands.push(command) {
            Ok(()) => true,
            Err(rtrb::PushError::Full(command)) => {
                log::warn!("transport command queue full, dropping {:?}", command);
                false
            }
        }
    }

    /// Lock-free view of transport state
    pub fn atomics(&self) -> Arc<TransportAtomics> {
        self.atomics.clone()
    }

    /// Stop the owner thread and wait for it to exit
    pub fn shutdown(self) {
        // Drop does the work
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.commands.push(TransportCommand::Shutdown);
            let _ = thread.join();
        }
    }
}

/// Spawn the engine owner thread
pub fn start_engine(
    config: EngineConfig,
    publisher: Box<dyn NowPlayingPublisher>,
) -> EngineHandle {
    let (tx, mut rx) = command_channel();
    let atomics = Arc::new(TransportAtomics::new());
    let thread_atomics = atomics.clone();

    let thread = thread::Builder::new()
        .name("slipstream-transport".to_string())
        .spawn(move || {
            let mut controller = TransportController::new(config, publisher, thread_atomics);
            let epoch = Instant::now();
            log::info!("transport thread started");

            'run: loop {
                let now = epoch.elapsed();
                while let Ok(command) = rx.pop() {
                    if matches!(command, TransportCommand::Shutdown) {
                        break 'run;
                    }
                    controller.handle_command(now, command);
                }
                controller.tick(now);

                let sleep = controller
                    .next_deadline()
                    .map(|due| due.saturating_sub(epoch.elapsed()))
                    .unwrap_or(IDLE_POLL)
                    .min(IDLE_POLL);
                if !sleep.is_zero() {
                    thread::sleep(sleep);
                }
            }

            // Leave the players silent on the way out
            if controller.state().is_playing() {
                controller.toggle(epoch.elapsed());
            }
            log::info!("transport thread stopped");
        })
        .expect("Failed to spawn transport thread");

    EngineHandle {
        commands: tx,
        atomics,
        thread: Some(thread),
    }
}
