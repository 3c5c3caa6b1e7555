//! Queue Manager
//!
//! Ordered list of queue entries plus the cursor and the autoplay boundary.
//!
//! Entries carry their own UUID so duplicates of one track stay
//! distinguishable; the engine binds sessions to entry ids, not track ids.

use segue_common::events::EnqueueSource;
use segue_common::Track;
use serde::Serialize;
use uuid::Uuid;

/// Queue entry wrapping an immutable track
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    /// Queue entry UUID
    pub entry_id: Uuid,

    pub track: Track,

    /// Manual or autoplay-derived
    pub source: EnqueueSource,
}

impl QueueEntry {
    pub fn new(track: Track, source: EnqueueSource) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            track,
            source,
        }
    }
}

/// Queue position tracking
///
/// Invariant: `current` is `None` or a valid index into `entries`.
#[derive(Debug, Default)]
pub struct QueueManager {
    entries: Vec<QueueEntry>,

    /// Cursor (None = empty / no selection)
    current: Option<usize>,

    /// First entry of the most recent autoplay batch
    autoplay_boundary: Option<usize>,
}

fn manual(tracks: Vec<Track>) -> impl Iterator<Item = QueueEntry> {
    tracks
        .into_iter()
        .map(|t| QueueEntry::new(t, EnqueueSource::Manual))
}

impl QueueManager {
    /// Create new empty queue manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole queue and cursor
    ///
    /// `start_index` beyond the end is clamped to the last entry.
    pub fn replace(&mut self, tracks: Vec<Track>, start_index: usize) {
        self.entries = manual(tracks).collect();
        self.current = if self.entries.is_empty() {
            None
        } else {
            Some(start_index.min(self.entries.len() - 1))
        };
        self.autoplay_boundary = None;
    }

    /// Append at the tail
    ///
    /// With no cursor, the first appended entry becomes current.
    /// Returns the index of the first appended entry.
    pub fn append(&mut self, tracks: Vec<Track>) -> usize {
        let first = self.entries.len();
        self.entries.extend(manual(tracks));
        self.autoplay_boundary = None;

        if self.current.is_none() && first < self.entries.len() {
            self.current = Some(first);
        }
        first
    }

    /// Insert immediately after the cursor
    ///
    /// With no cursor the tracks go to the front and the first becomes current.
    /// Returns the index of the first inserted entry.
    pub fn insert_next(&mut self, tracks: Vec<Track>) -> usize {
        self.autoplay_boundary = None;
        if tracks.is_empty() {
            return self.current.map_or(0, |c| c + 1);
        }

        match self.current {
            Some(current) => {
                let at = current + 1;
                self.entries.splice(at..at, manual(tracks));
                at
            }
            None => {
                self.entries.splice(0..0, manual(tracks));
                self.current = Some(0);
                0
            }
        }
    }

    /// Append autoplay suggestions
    ///
    /// The boundary moves to the first entry of this batch. Returns the new
    /// boundary, or `None` if `tracks` was empty.
    pub fn append_autoplay(&mut self, tracks: Vec<Track>) -> Option<usize> {
        if tracks.is_empty() {
            return None;
        }
        let first = self.entries.len();
        self.entries.extend(
            tracks
                .into_iter()
                .map(|t| QueueEntry::new(t, EnqueueSource::Automatic)),
        );
        self.autoplay_boundary = Some(first);
        Some(first)
    }

    /// Remove a non-current entry
    ///
    /// Returns the removed entry; the current entry is never removed here.
    pub fn remove(&mut self, entry_id: Uuid) -> Option<QueueEntry> {
        let index = self.entries.iter().position(|e| e.entry_id == entry_id)?;
        if Some(index) == self.current {
            return None;
        }

        let removed = self.entries.remove(index);
        if let Some(current) = self.current {
            if index < current {
                self.current = Some(current - 1);
            }
        }
        self.autoplay_boundary = None;
        Some(removed)
    }

    /// Move the cursor forward
    ///
    /// Returns the new current entry, or None (cursor unchanged) at the end.
    pub fn advance(&mut self) -> Option<&QueueEntry> {
        let next = self.current? + 1;
        if next >= self.entries.len() {
            return None;
        }
        self.current = Some(next);
        self.entries.get(next)
    }

    /// Move the cursor back
    ///
    /// Returns the new current entry, or None (cursor unchanged) at the start.
    pub fn retreat(&mut self) -> Option<&QueueEntry> {
        let previous = self.current?.checked_sub(1)?;
        self.current = Some(previous);
        self.entries.get(previous)
    }

    /// Drop the cursor but keep the entries (queue exhausted)
    pub fn clear_selection(&mut self) {
        self.current = None;
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
        self.autoplay_boundary = None;
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Entry at `current + 1`
    pub fn peek_next(&self) -> Option<&QueueEntry> {
        self.current.and_then(|i| self.entries.get(i + 1))
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn entry_ids(&self) -> Vec<Uuid> {
        self.entries.iter().map(|e| e.entry_id).collect()
    }

    pub fn autoplay_boundary(&self) -> Option<usize> {
        self.autoplay_boundary
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track::new(id, format!("Track {}", id), 30.0)
    }

    fn ids(manager: &QueueManager) -> Vec<String> {
        manager.entries().iter().map(|e| e.track.id.clone()).collect()
    }

    #[test]
    fn test_queue_manager_creation() {
        let manager = QueueManager::new();
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);
        assert!(manager.current().is_none());
        assert!(manager.current_index().is_none());
    }

    #[test]
    fn test_replace_sets_cursor_and_clamps() {
        let mut manager = QueueManager::new();
        manager.replace(vec![track("a"), track("b"), track("c")], 1);
        assert_eq!(manager.current_index(), Some(1));
        assert_eq!(manager.current().unwrap().track.id, "b");

        manager.replace(vec![track("a"), track("b")], 10);
        assert_eq!(manager.current_index(), Some(1));

        manager.replace(Vec::new(), 0);
        assert!(manager.current_index().is_none());
    }

    #[test]
    fn test_duplicates_get_distinct_entry_ids() {
        let mut manager = QueueManager::new();
        manager.replace(vec![track("a"), track("a")], 0);
        let entries = manager.entries();
        assert_eq!(entries[0].track.id, entries[1].track.id);
        assert_ne!(entries[0].entry_id, entries[1].entry_id);
    }

    #[test]
    fn test_append_selects_first_when_no_cursor() {
        let mut manager = QueueManager::new();
        let first = manager.append(vec![track("a"), track("b")]);
        assert_eq!(first, 0);
        assert_eq!(manager.current_index(), Some(0));

        let first = manager.append(vec![track("c")]);
        assert_eq!(first, 2);
        assert_eq!(manager.current_index(), Some(0));
        assert_eq!(ids(&manager), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_next_goes_after_cursor() {
        let mut manager = QueueManager::new();
        manager.replace(vec![track("a"), track("b"), track("c")], 1);
        let at = manager.insert_next(vec![track("x"), track("y")]);
        assert_eq!(at, 2);
        assert_eq!(ids(&manager), vec!["a", "b", "x", "y", "c"]);
        assert_eq!(manager.peek_next().unwrap().track.id, "x");
    }

    #[test]
    fn test_insert_next_without_cursor_becomes_current() {
        let mut manager = QueueManager::new();
        let at = manager.insert_next(vec![track("x")]);
        assert_eq!(at, 0);
        assert_eq!(manager.current().unwrap().track.id, "x");
    }

    #[test]
    fn test_append_autoplay_sets_boundary_and_source() {
        let mut manager = QueueManager::new();
        manager.replace(vec![track("a")], 0);
        let boundary = manager.append_autoplay(vec![track("c"), track("d")]);
        assert_eq!(boundary, Some(1));
        assert_eq!(manager.autoplay_boundary(), Some(1));
        assert_eq!(manager.entries()[0].source, EnqueueSource::Manual);
        assert_eq!(manager.entries()[1].source, EnqueueSource::Automatic);
        assert_eq!(manager.entries()[2].source, EnqueueSource::Automatic);

        // A second batch moves the boundary to its own start
        let boundary = manager.append_autoplay(vec![track("e")]);
        assert_eq!(boundary, Some(3));
        assert_eq!(manager.autoplay_boundary(), Some(3));

        // Empty batch leaves everything alone
        assert_eq!(manager.append_autoplay(Vec::new()), None);
        assert_eq!(manager.autoplay_boundary(), Some(3));
    }

    #[test]
    fn test_manual_mutations_clear_boundary() {
        let mut manager = QueueManager::new();
        manager.replace(vec![track("a")], 0);

        manager.append_autoplay(vec![track("c")]);
        manager.append(vec![track("m")]);
        assert!(manager.autoplay_boundary().is_none());

        manager.append_autoplay(vec![track("c")]);
        manager.insert_next(vec![track("m")]);
        assert!(manager.autoplay_boundary().is_none());

        manager.append_autoplay(vec![track("c")]);
        manager.replace(vec![track("z")], 0);
        assert!(manager.autoplay_boundary().is_none());

        manager.append_autoplay(vec![track("c")]);
        manager.clear();
        assert!(manager.autoplay_boundary().is_none());
    }

    #[test]
    fn test_advance_and_retreat_bounds() {
        let mut manager = QueueManager::new();
        manager.replace(vec![track("a"), track("b")], 0);

        assert!(manager.retreat().is_none());
        assert_eq!(manager.current_index(), Some(0));

        assert_eq!(manager.advance().unwrap().track.id, "b");
        assert_eq!(manager.current_index(), Some(1));

        assert!(manager.advance().is_none());
        assert_eq!(manager.current_index(), Some(1));

        assert_eq!(manager.retreat().unwrap().track.id, "a");
        assert_eq!(manager.current_index(), Some(0));
    }

    #[test]
    fn test_advance_without_cursor() {
        let mut manager = QueueManager::new();
        assert!(manager.advance().is_none());
        assert!(manager.retreat().is_none());
    }

    #[test]
    fn test_remove_shifts_cursor() {
        let mut manager = QueueManager::new();
        manager.replace(vec![track("a"), track("b"), track("c")], 1);
        let first_id = manager.entries()[0].entry_id;
        let current_id = manager.entries()[1].entry_id;

        // Current entry is never removed
        assert!(manager.remove(current_id).is_none());

        let removed = manager.remove(first_id).unwrap();
        assert_eq!(removed.track.id, "a");
        assert_eq!(manager.current_index(), Some(0));
        assert_eq!(manager.current().unwrap().track.id, "b");

        assert!(manager.remove(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_clear_selection_keeps_entries() {
        let mut manager = QueueManager::new();
        manager.replace(vec![track("a")], 0);
        manager.clear_selection();
        assert!(manager.current().is_none());
        assert_eq!(manager.len(), 1);
    }
}
