//! Track transitions - position handling, prestart, promotion, autoplay
//!
//! Timeline of one transition, relative to the active track's end:
//! - `autoplay_lead`: nothing queued behind the current track, ask the
//!   autoplay supplier (once per entry)
//! - `prestart_lead`: start the warm pending session at volume 0
//! - `end_epsilon` or the finish callback: promote pending to active
//!
//! Promotion only acts on callbacks from the live active session; anything
//! from a released or replaced session is dropped, which keeps the end of a
//! track from being handled twice.

use super::core::{AutoplayFetch, PlaybackEngine};
use super::pair::{ActiveSlot, PendingSlot};
use crate::error::Result;
use crate::playback::events::{EngineMessage, SessionEvent};
use segue_common::events::{PlaybackState, QueueChangeTrigger, SegueEvent};
use segue_common::Track;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

impl PlaybackEngine {
    pub(super) fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Position {
                session_id,
                position,
                duration,
            } => {
                if self.sessions.live_active_id() != Some(session_id) {
                    trace!("Ignoring position from {}", session_id);
                    return;
                }
                self.on_position(position, duration);
            }
            SessionEvent::Finished { session_id } => {
                if self.sessions.live_active_id() != Some(session_id) {
                    debug!("Ignoring finish from {}", session_id);
                    return;
                }
                debug!("Active {} finished", session_id);
                self.on_active_end(true);
            }
        }
    }

    fn on_position(&mut self, position: f64, reported_duration: f64) {
        if !self.state.is_playing() {
            return;
        }

        self.position = position.max(0.0);
        if reported_duration.is_finite() && reported_duration > 0.0 {
            self.duration = reported_duration;
        }

        if let Some(entry) = self.queue.current() {
            self.shared.broadcast_event(SegueEvent::PlaybackProgress {
                entry_id: entry.entry_id,
                position: self.position,
                duration: self.duration,
                timestamp: chrono::Utc::now(),
            });
        }

        if self.duration <= 0.0 {
            return;
        }
        let remaining = self.duration - self.position;

        if self.queue.peek_next().is_none() && remaining <= self.tuning.autoplay_lead_secs {
            self.request_autoplay(false);
        }
        if remaining <= self.tuning.prestart_lead_secs {
            self.prestart_pending();
        }
        if remaining <= self.tuning.end_epsilon_secs {
            self.on_active_end(false);
        }
    }

    /// Start a warm pending session muted
    fn prestart_pending(&mut self) {
        self.sessions.pending = match self.sessions.take_pending() {
            PendingSlot::Warm(mut live) => {
                live.session.set_volume(0.0);
                match live.session.play() {
                    Ok(()) => {
                        debug!("Prestarted {} (entry {})", live.id, live.entry_id);
                        PendingSlot::Prestarted(live)
                    }
                    Err(e) => {
                        warn!("Prestart of {} failed: {}", live.id, e);
                        live.release();
                        PendingSlot::Cold
                    }
                }
            }
            other => other,
        };
    }

    /// The active track ended (epsilon reached or finish callback)
    ///
    /// Without a following entry, only the finish callback counts: the last
    /// track plays out completely before autoplay or exhaustion.
    fn on_active_end(&mut self, finished: bool) {
        if self.queue.peek_next().is_some() {
            self.promote(true);
            return;
        }
        if !finished {
            return;
        }
        if self.await_autoplay() {
            return;
        }
        self.exhaust();
    }

    /// Make the next entry current and move the pending session into the
    /// active role
    ///
    /// `completed` is false when the user skipped.
    pub(super) fn promote(&mut self, completed: bool) {
        let Some(next) = self.queue.peek_next().cloned() else {
            return;
        };

        self.finish_current(completed);
        let pending = self.sessions.take_pending();
        self.queue.advance();
        self.reset_position();
        self.autoplay = AutoplayFetch::Idle;

        info!(
            "Advancing to {} ({}) at index {}",
            next.track.title,
            next.track.id,
            self.queue.current_index().unwrap_or(0)
        );
        self.emit_queue_changed(QueueChangeTrigger::TrackAdvance);

        match pending {
            PendingSlot::Warm(live) | PendingSlot::Prestarted(live)
                if live.entry_id == next.entry_id =>
            {
                self.install_active(live, !completed);
            }
            PendingSlot::Loading { id, entry_id } if entry_id == next.entry_id => {
                debug!("{} still loading, handing it to the active slot", id);
                self.sessions.active = ActiveSlot::Loading { id, entry_id };
                self.set_state(PlaybackState::Loading);
                self.refresh_pending();
            }
            other => {
                other.release();
                self.load_active(0.0);
            }
        }
    }

    /// Create a fresh active session for the current entry
    pub(super) fn load_active(&mut self, start_position: f64) {
        let Some(entry) = self.queue.current().cloned() else {
            return;
        };
        self.sessions.release_active();

        let id = self.request_session(entry.track, start_position, false);
        self.sessions.active = ActiveSlot::Loading {
            id,
            entry_id: entry.entry_id,
        };
        self.set_state(PlaybackState::Loading);
        self.refresh_pending();
    }

    /// Keep the pending slot bound to the entry after the cursor
    ///
    /// Called after every queue mutation and transition. A pending session
    /// for the wrong entry is released; a missing one is created when an
    /// active session exists.
    pub(super) fn refresh_pending(&mut self) {
        let next = self
            .queue
            .peek_next()
            .map(|e| (e.entry_id, e.track.clone()));

        match next {
            Some((entry_id, _)) if self.sessions.pending.entry_id() == Some(entry_id) => {}
            Some((entry_id, track)) if self.sessions.has_active() => {
                self.sessions.release_pending();
                let id = self.request_session(track, 0.0, true);
                debug!("Warming {} for entry {}", id, entry_id);
                self.sessions.pending = PendingSlot::Loading { id, entry_id };
            }
            _ => self.sessions.release_pending(),
        }
    }

    pub(super) fn awaiting_autoplay(&self) -> bool {
        matches!(
            self.autoplay,
            AutoplayFetch::InFlight {
                continue_on_arrival: true,
                ..
            }
        )
    }

    /// Ask the supplier for suggestions seeded by the current track
    ///
    /// Returns true if a fetch for the current entry is in flight afterwards.
    pub(super) fn request_autoplay(&mut self, continue_on_arrival: bool) -> bool {
        if !self.autoplay_enabled {
            return false;
        }
        let Some(supplier) = self.deps.supplier.as_ref().map(Arc::clone) else {
            return false;
        };
        let Some(entry) = self.queue.current() else {
            return false;
        };
        let entry_id = entry.entry_id;
        let seed_track_id = entry.track.id.clone();

        match &mut self.autoplay {
            AutoplayFetch::InFlight {
                entry_id: in_flight,
                continue_on_arrival: resume,
            } if *in_flight == entry_id => {
                *resume |= continue_on_arrival;
                return true;
            }
            AutoplayFetch::Settled { entry_id: settled } if *settled == entry_id => return false,
            _ => {}
        }

        info!("Requesting autoplay suggestions for {}", seed_track_id);
        let limit = self.tuning.autoplay_limit;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = supplier.fetch_similar(&seed_track_id, limit).await;
            let _ = tx.send(EngineMessage::AutoplayFetched {
                entry_id,
                seed_track_id,
                result,
            });
        });

        self.autoplay = AutoplayFetch::InFlight {
            entry_id,
            continue_on_arrival,
        };
        true
    }

    /// The last track finished; wait for suggestions if any are coming
    fn await_autoplay(&mut self) -> bool {
        if !self.request_autoplay(true) {
            return false;
        }
        info!("Queue end reached, waiting for autoplay suggestions");
        self.finish_current(true);
        self.sessions.release_pending();
        self.set_state(PlaybackState::Loading);
        true
    }

    pub(super) fn on_autoplay_fetched(
        &mut self,
        entry_id: Uuid,
        seed_track_id: String,
        result: Result<Vec<Track>>,
    ) {
        let continue_on_arrival = match self.autoplay {
            AutoplayFetch::InFlight {
                entry_id: in_flight,
                continue_on_arrival,
            } if in_flight == entry_id => continue_on_arrival,
            _ => {
                debug!("Discarding stale autoplay result for {}", seed_track_id);
                return;
            }
        };
        self.autoplay = AutoplayFetch::Settled { entry_id };

        let tracks = match result {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Autoplay supplier failed for {}: {}", seed_track_id, e);
                Vec::new()
            }
        };

        let count = tracks.len();
        let Some(boundary) = self.queue.append_autoplay(tracks) else {
            info!("No autoplay suggestions for {}", seed_track_id);
            if continue_on_arrival {
                self.exhaust();
            }
            return;
        };

        info!(
            "Appended {} autoplay tracks for {} at index {}",
            count, seed_track_id, boundary
        );
        self.shared.broadcast_event(SegueEvent::AutoplayAppended {
            seed_track_id,
            count,
            boundary,
            timestamp: chrono::Utc::now(),
        });
        self.emit_queue_changed(QueueChangeTrigger::AutoplayAppend);

        if continue_on_arrival {
            self.promote(true);
        } else {
            self.refresh_pending();
        }
    }

    /// Nothing left to play: release everything and deselect
    pub(super) fn exhaust(&mut self) {
        info!("Queue exhausted");
        self.finish_current(true);
        self.sessions.release_all();
        self.queue.clear_selection();
        self.reset_position();
        self.autoplay = AutoplayFetch::Idle;
        self.play_intent = false;

        self.deps.metadata.publish(None);
        self.emit_queue_changed(QueueChangeTrigger::Exhausted);
        self.set_state(PlaybackState::Idle);
    }
}
