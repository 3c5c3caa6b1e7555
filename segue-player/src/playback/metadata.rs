//! Now-playing metadata publishing
//!
//! Implementations push the current track to the OS media surface (lock
//! screen, media keys overlay). Publishing is fire-and-forget and must not
//! block the engine.

use segue_common::Track;
use tracing::info;

pub trait MetadataSink: Send + Sync {
    /// Publish the now-playing track, or `None` to clear it
    fn publish(&self, track: Option<&Track>);
}

/// Writes now-playing changes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMetadataSink;

impl MetadataSink for LoggingMetadataSink {
    fn publish(&self, track: Option<&Track>) {
        match track {
            Some(t) => info!(
                "Now playing: {} ({}) [{:.1}s]",
                t.title, t.id, t.duration_seconds
            ),
            None => info!("Now playing: nothing"),
        }
    }
}
