//! Slipstream Core - Speed-reactive stem playback engine
//!
//! Plays the stems of one soundtrack through independent audio players,
//! keeps them phase-locked, and re-balances per-stem volume from a live
//! travel-speed signal. Audio decoding and output belong to the host's
//! player capability; this crate only coordinates.

pub mod config;
pub mod loader;
pub mod mix;
pub mod nowplaying;
pub mod player;
pub mod soundtrack;
pub mod transport;
pub mod types;

pub use types::*;
