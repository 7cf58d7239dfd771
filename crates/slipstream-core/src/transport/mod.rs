//! Transport - state machine, drift correction, fade scheduling
//!
//! This module is the engine's single-owner core:
//! - TransportController: play/pause/rewind/switch state machine
//! - PlaybackClock: master time + per-tick drift correction
//! - Scheduler: cancellable task timeline for resync ticks and fade steps
//! - command queue + atomics: the lock-free boundary to the rest of the app
//! - service: the owner thread that serializes every mutation

mod atomics;
mod clock;
mod command;
mod controller;
mod lane;
mod sched;
mod service;

pub use atomics::*;
pub use clock::*;
pub use command::*;
pub use controller::*;
pub use lane::*;
pub use sched::*;
pub use service::*;
