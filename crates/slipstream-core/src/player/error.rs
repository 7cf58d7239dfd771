//! Player binding error types

use thiserror::Error;

/// Errors that can occur while binding a stem to a player
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The audio source reference does not resolve to anything
    #[error("Audio source not found: {0}")]
    SourceMissing(String),

    /// The source exists but the host player cannot open it
    #[error("Audio source unreadable: {source_ref}: {reason}")]
    SourceUnreadable { source_ref: String, reason: String },

    /// The host audio layer refused to create a player
    #[error("Player backend error: {0}")]
    Backend(String),
}

/// Result type for player operations
pub type PlayerResult<T> = Result<T, PlayerError>;
