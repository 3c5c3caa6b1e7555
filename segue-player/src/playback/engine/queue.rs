//! Queue operations module
//!
//! **Responsibilities:**
//! - Queue mutations (replace, append, insert-next, remove, clear)
//! - Re-binding the pending session after each mutation
//! - Queue event emission (QueueChanged)

use super::core::{AutoplayFetch, PlaybackEngine};
use crate::error::Result;
use segue_common::events::{PlaybackState, QueueChangeTrigger};
use segue_common::Track;
use tracing::{debug, info};
use uuid::Uuid;

impl PlaybackEngine {
    /// Replace the queue and select `start_index`
    ///
    /// Hard reset: any playback stops, both sessions are released and the
    /// engine ends up Idle with the new selection.
    pub(super) fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        info!(
            "Replacing queue with {} tracks (start index {})",
            tracks.len(),
            start_index
        );

        self.finish_current(false);
        self.sessions.release_all();
        self.queue.replace(tracks, start_index);
        self.reset_position();
        self.autoplay = AutoplayFetch::Idle;
        self.play_intent = false;
        self.announced = None;

        if self.queue.current().is_none() {
            self.deps.metadata.publish(None);
        }
        self.emit_queue_changed(QueueChangeTrigger::UserReplace);
        self.set_state(PlaybackState::Idle);
        Ok(())
    }

    /// Play `track` within `queue`
    ///
    /// If the track is not part of `queue` it is put in front of it.
    pub(super) fn play_track(&mut self, track: Track, queue: Vec<Track>) -> Result<()> {
        let (tracks, start_index) = match queue.iter().position(|t| t.id == track.id) {
            Some(index) => (queue, index),
            None => {
                let mut tracks = queue;
                tracks.insert(0, track);
                (tracks, 0)
            }
        };

        self.set_queue(tracks, start_index)?;
        self.play()
    }

    /// Append manual tracks at the tail
    pub(super) fn add_to_queue(&mut self, tracks: Vec<Track>) -> Result<()> {
        if tracks.is_empty() {
            debug!("Add to queue ignored: no tracks");
            return Ok(());
        }
        info!("Appending {} tracks to queue", tracks.len());

        let waiting = self.awaiting_autoplay();
        let had_selection = self.queue.current().is_some();

        self.queue.append(tracks);
        self.autoplay = AutoplayFetch::Idle;
        if !had_selection {
            self.reset_position();
        }
        self.emit_queue_changed(QueueChangeTrigger::UserEnqueue);

        self.continue_or_rebind(waiting);
        Ok(())
    }

    /// Insert manual tracks right after the current one
    pub(super) fn play_next(&mut self, tracks: Vec<Track>) -> Result<()> {
        if tracks.is_empty() {
            debug!("Play next ignored: no tracks");
            return Ok(());
        }
        info!("Inserting {} tracks after current", tracks.len());

        let waiting = self.awaiting_autoplay();
        let had_selection = self.queue.current().is_some();

        self.queue.insert_next(tracks);
        self.autoplay = AutoplayFetch::Idle;
        if !had_selection {
            self.reset_position();
        }
        self.emit_queue_changed(QueueChangeTrigger::UserInsertNext);

        self.continue_or_rebind(waiting);
        Ok(())
    }

    /// Remove a non-current entry
    pub(super) fn remove_from_queue(&mut self, entry_id: Uuid) -> Result<()> {
        match self.queue.remove(entry_id) {
            Some(entry) => {
                info!("Removed {} ({}) from queue", entry.track.title, entry.entry_id);
                self.emit_queue_changed(QueueChangeTrigger::UserDequeue);
                self.refresh_pending();
            }
            None => debug!("Remove ignored: entry {} not found or current", entry_id),
        }
        Ok(())
    }

    /// Empty the queue and stop
    pub(super) fn clear_queue(&mut self) -> Result<()> {
        info!("Clearing queue");

        self.finish_current(false);
        self.sessions.release_all();
        self.queue.clear();
        self.reset_position();
        self.autoplay = AutoplayFetch::Idle;
        self.play_intent = false;
        self.announced = None;

        self.deps.metadata.publish(None);
        self.emit_queue_changed(QueueChangeTrigger::UserDequeue);
        self.set_state(PlaybackState::Idle);
        Ok(())
    }

    /// After a manual insertion: continue if the engine was waiting at the
    /// end of the queue, otherwise re-bind the pending session
    fn continue_or_rebind(&mut self, waiting: bool) {
        if waiting && self.queue.peek_next().is_some() {
            self.promote(true);
        } else {
            self.refresh_pending();
        }
    }
}
