//! Consumer handle to the playback engine
//!
//! Every method enqueues one message on the engine channel and, for
//! commands, waits for the engine to have applied it. Handles are cheap to
//! clone and can be used from any task.

use crate::error::{Error, Result};
use crate::playback::events::{Command, EngineMessage};
use crate::state::{PlayerSnapshot, SharedState};
use segue_common::events::SegueEvent;
use segue_common::Track;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use uuid::Uuid;

#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<EngineMessage>,
    shared: Arc<SharedState>,
}

impl PlayerHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<EngineMessage>, shared: Arc<SharedState>) -> Self {
        Self { tx, shared }
    }

    async fn send(&self, command: Command) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineMessage::Command { command, reply })
            .map_err(|_| Error::EngineStopped)?;
        rx.await.map_err(|_| Error::EngineStopped)?
    }

    pub async fn play(&self) -> Result<()> {
        self.send(Command::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    /// Seek within the current track; out-of-range values are clamped
    pub async fn seek_to(&self, seconds: f64) -> Result<()> {
        if seconds.is_nan() {
            return Err(Error::InvalidCommand("seek position is NaN".to_string()));
        }
        self.send(Command::SeekTo(seconds)).await
    }

    /// Set process volume; clamped to 0.0-1.0
    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        if volume.is_nan() {
            return Err(Error::InvalidCommand("volume is NaN".to_string()));
        }
        self.send(Command::SetVolume(volume)).await
    }

    /// Replace the queue; playback stops and the engine goes Idle
    pub async fn set_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.send(Command::SetQueue {
            tracks,
            start_index,
        })
        .await
    }

    /// Replace the queue with `queue` and start playing `track`
    pub async fn play_track(&self, track: Track, queue: Vec<Track>) -> Result<()> {
        self.send(Command::PlayTrack { track, queue }).await
    }

    pub async fn add_to_queue(&self, tracks: Vec<Track>) -> Result<()> {
        self.send(Command::AddToQueue(tracks)).await
    }

    pub async fn play_next(&self, tracks: Vec<Track>) -> Result<()> {
        self.send(Command::PlayNext(tracks)).await
    }

    /// Remove an entry other than the current one
    pub async fn remove_from_queue(&self, entry_id: Uuid) -> Result<()> {
        self.send(Command::RemoveFromQueue(entry_id)).await
    }

    pub async fn clear_queue(&self) -> Result<()> {
        self.send(Command::ClearQueue).await
    }

    pub async fn skip_to_next(&self) -> Result<()> {
        self.send(Command::SkipToNext).await
    }

    pub async fn skip_to_previous(&self) -> Result<()> {
        self.send(Command::SkipToPrevious).await
    }

    pub async fn set_autoplay(&self, enabled: bool) -> Result<()> {
        self.send(Command::SetAutoplay(enabled)).await
    }

    /// Stop the engine and release all sessions
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// Snapshot taken by the engine after every message queued before this
    /// call has been processed
    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineMessage::Snapshot { reply })
            .map_err(|_| Error::EngineStopped)?;
        rx.await.map_err(|_| Error::EngineStopped)
    }

    /// Most recently published snapshot, without a round trip to the engine
    pub async fn latest_snapshot(&self) -> PlayerSnapshot {
        self.shared.snapshot().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SegueEvent> {
        self.shared.subscribe_events()
    }
}
