//! Engine-internal message types
//!
//! Everything that can change engine state arrives as an `EngineMessage` on a
//! single channel: consumer commands, session callbacks, and the completion
//! of slow work (session creation, autoplay fetches) spawned by the engine.
//! The engine task processes them strictly one at a time.

use crate::error::Result;
use crate::playback::session::{AudioSession, SessionId};
use crate::state::PlayerSnapshot;
use segue_common::Track;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Callback from a live session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// Periodic position report
    Position {
        session_id: SessionId,
        position: f64,
        duration: f64,
    },

    /// Natural end of stream
    Finished { session_id: SessionId },
}

/// Consumer commands
#[derive(Debug, Clone)]
pub enum Command {
    Play,
    Pause,
    SeekTo(f64),
    SetVolume(f32),
    SetQueue {
        tracks: Vec<Track>,
        start_index: usize,
    },
    PlayTrack {
        track: Track,
        queue: Vec<Track>,
    },
    AddToQueue(Vec<Track>),
    PlayNext(Vec<Track>),
    RemoveFromQueue(Uuid),
    ClearQueue,
    SkipToNext,
    SkipToPrevious,
    SetAutoplay(bool),
    Shutdown,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::SeekTo(_) => "seek_to",
            Command::SetVolume(_) => "set_volume",
            Command::SetQueue { .. } => "set_queue",
            Command::PlayTrack { .. } => "play_track",
            Command::AddToQueue(_) => "add_to_queue",
            Command::PlayNext(_) => "play_next",
            Command::RemoveFromQueue(_) => "remove_from_queue",
            Command::ClearQueue => "clear_queue",
            Command::SkipToNext => "skip_to_next",
            Command::SkipToPrevious => "skip_to_previous",
            Command::SetAutoplay(_) => "set_autoplay",
            Command::Shutdown => "shutdown",
        }
    }
}

/// Message processed by the engine task
pub enum EngineMessage {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<()>>,
    },

    Snapshot {
        reply: oneshot::Sender<PlayerSnapshot>,
    },

    Session(SessionEvent),

    /// Session creation finished (resolve + factory)
    SessionReady {
        session_id: SessionId,
        result: Result<Box<dyn AudioSession>>,
    },

    /// Autoplay supplier answered for the entry that was current when asked
    AutoplayFetched {
        entry_id: Uuid,
        seed_track_id: String,
        result: Result<Vec<Track>>,
    },
}
