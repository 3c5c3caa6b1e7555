//! Shared player state
//!
//! The engine task is the only writer. After every processed message it
//! mirrors its observable state into `SharedState`, so readers (UI, tests,
//! the demo binary) never wait on the engine.

use crate::playback::queue_manager::QueueEntry;
use crate::playback::session::SessionId;
use segue_common::events::{EventBus, PlaybackState, SegueEvent};
use segue_common::Track;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Phase of the pending (next-track) session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PendingPhase {
    /// No pending session
    #[default]
    Cold,
    /// Creation in flight
    Loading,
    /// Created, muted, not started
    Warm,
    /// Playing muted in parallel with the active session
    Prestarted,
}

/// Observable state snapshot
#[derive(Debug, Clone, Serialize, Default)]
pub struct PlayerSnapshot {
    pub queue: Vec<QueueEntry>,
    pub current_index: Option<usize>,
    pub current_track: Option<Track>,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub is_loading: bool,
    /// Seconds into the current track
    pub position: f64,
    /// Seconds; nominal until the live session reports its own
    pub duration: f64,
    pub volume: f32,
    pub last_error: Option<String>,
    pub autoplay_boundary: Option<usize>,
    pub autoplay_enabled: bool,
    pub pending_phase: PendingPhase,
    /// Queue entry the pending session is bound to
    pub pending_entry_id: Option<Uuid>,
    /// Active session, loading or live
    pub active_session_id: Option<SessionId>,
    pub pending_session_id: Option<SessionId>,
}

impl PlayerSnapshot {
    pub fn current_entry_id(&self) -> Option<Uuid> {
        self.current_index
            .and_then(|i| self.queue.get(i))
            .map(|e| e.entry_id)
    }
}

/// Shared state accessible by all components
pub struct SharedState {
    snapshot: RwLock<PlayerSnapshot>,

    /// Event broadcaster
    event_bus: EventBus,
}

impl SharedState {
    pub fn new(event_capacity: usize, initial: PlayerSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(initial),
            event_bus: EventBus::new(event_capacity),
        }
    }

    /// Broadcast an event, nobody listening is fine
    pub fn broadcast_event(&self, event: SegueEvent) {
        self.event_bus.emit_lossy(event);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SegueEvent> {
        self.event_bus.subscribe()
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn set_snapshot(&self, snapshot: PlayerSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}
