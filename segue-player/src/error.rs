//! Error types for segue-player
//!
//! Nothing here is fatal to the engine: load failures become `last_error`,
//! supplier failures are swallowed, invalid commands are no-ops.

use thiserror::Error;

/// Main error type for segue-player
#[derive(Error, Debug)]
pub enum Error {
    /// Session could not be created or started
    #[error("Load failure: {0}")]
    Load(String),

    /// Autoplay supplier fetch failed
    #[error("Autoplay supplier error: {0}")]
    Supplier(String),

    /// Command not applicable in the current state
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors bubbled up from segue-common (config files, playlists)
    #[error(transparent)]
    Common(#[from] segue_common::Error),

    /// Engine task is gone (handle used after shutdown)
    #[error("Playback engine stopped")]
    EngineStopped,
}

/// Convenience Result type using segue-player Error
pub type Result<T> = std::result::Result<T, Error>;
