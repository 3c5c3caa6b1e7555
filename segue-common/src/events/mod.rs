//! Event types for the Segue event system
//!
//! Provides shared event definitions and the EventBus used by the player to
//! publish observable state changes.

mod playback_types;
mod queue_types;

pub use playback_types::PlaybackState;
pub use queue_types::{EnqueueSource, QueueChangeTrigger};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Segue event types
///
/// Events are broadcast via EventBus and can be serialized for any outer
/// transport a consumer chooses (IPC, websocket, logs).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SegueEvent {
    /// Playback state changed
    PlaybackStateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A queue entry became the audible track
    TrackStarted {
        /// Queue entry UUID (distinguishes duplicates of one track)
        entry_id: Uuid,
        track_id: String,
        /// Cursor position of the entry
        queue_index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A queue entry stopped being the audible track
    TrackCompleted {
        entry_id: Uuid,
        track_id: String,
        /// Seconds played before the track ended or was left
        position: f64,
        /// Whether the track played to its end (false if skipped/replaced)
        completed: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback progress update
    ///
    /// Emitted lossy from position callbacks; nobody listening is fine.
    PlaybackProgress {
        entry_id: Uuid,
        position: f64,
        duration: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue contents or cursor changed
    QueueChanged {
        /// Entry UUIDs in play order
        queue: Vec<Uuid>,
        current_index: Option<usize>,
        autoplay_boundary: Option<usize>,
        trigger: QueueChangeTrigger,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Autoplay supplier results were appended
    AutoplayAppended {
        /// Track the suggestions were fetched for
        seed_track_id: String,
        count: usize,
        boundary: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Process volume changed
    VolumeChanged {
        volume: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A load/play attempt failed
    PlaybackError {
        track_id: Option<String>,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SegueEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            SegueEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            SegueEvent::TrackStarted { .. } => "TrackStarted",
            SegueEvent::TrackCompleted { .. } => "TrackCompleted",
            SegueEvent::PlaybackProgress { .. } => "PlaybackProgress",
            SegueEvent::QueueChanged { .. } => "QueueChanged",
            SegueEvent::AutoplayAppended { .. } => "AutoplayAppended",
            SegueEvent::VolumeChanged { .. } => "VolumeChanged",
            SegueEvent::PlaybackError { .. } => "PlaybackError",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block the engine)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use segue_common::events::{EventBus, SegueEvent, PlaybackState};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(SegueEvent::PlaybackStateChanged {
///     old_state: PlaybackState::Paused,
///     new_state: PlaybackState::Playing,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "PlaybackStateChanged");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SegueEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before the oldest ones are
    /// dropped for lagging subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SegueEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SegueEvent,
    ) -> Result<usize, broadcast::error::SendError<SegueEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SegueEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
