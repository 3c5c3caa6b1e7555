//! Queue type definitions
//!
//! Supporting types for queue management and queue change notifications.

use serde::{Deserialize, Serialize};

/// Why the queue changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum QueueChangeTrigger {
    /// Whole queue replaced (set queue / play track)
    UserReplace,
    /// Tracks appended at the tail
    UserEnqueue,
    /// Tracks inserted right after the current entry
    UserInsertNext,
    /// Entry removed or queue cleared
    UserDequeue,
    /// Suggestions appended by the autoplay supplier
    AutoplayAppend,
    /// Cursor moved by promotion or skip
    TrackAdvance,
    /// Last entry finished with nothing to continue into
    Exhausted,
}

impl std::fmt::Display for QueueChangeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueChangeTrigger::UserReplace => write!(f, "UserReplace"),
            QueueChangeTrigger::UserEnqueue => write!(f, "UserEnqueue"),
            QueueChangeTrigger::UserInsertNext => write!(f, "UserInsertNext"),
            QueueChangeTrigger::UserDequeue => write!(f, "UserDequeue"),
            QueueChangeTrigger::AutoplayAppend => write!(f, "AutoplayAppend"),
            QueueChangeTrigger::TrackAdvance => write!(f, "TrackAdvance"),
            QueueChangeTrigger::Exhausted => write!(f, "Exhausted"),
        }
    }
}

/// How a queue entry got into the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EnqueueSource {
    /// Autoplay supplier suggestion
    Automatic,
    /// Queued by the user
    Manual,
}

impl std::fmt::Display for EnqueueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnqueueSource::Automatic => write!(f, "Automatic"),
            EnqueueSource::Manual => write!(f, "Manual"),
        }
    }
}
