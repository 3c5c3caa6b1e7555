//! # Segue Player Library (segue-player)
//!
//! Gapless playback queue engine.
//!
//! **Purpose:** Own the play queue and the audio sessions that play it, and
//! hand each track over to the next without an audible gap by warming and
//! muted-prestarting the next track's session before the current one ends.
//!
//! **Architecture:** A single tokio task owns all playback state and
//! processes commands, session callbacks and background results one message
//! at a time. Platform audio, stream URIs, autoplay suggestions and
//! now-playing metadata are reached through traits (`playback::session`,
//! `playback::autoplay`, `playback::metadata`).

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
pub use playback::{EngineDeps, PlaybackEngine, PlayerHandle};
pub use state::{PendingPhase, PlayerSnapshot, SharedState};
