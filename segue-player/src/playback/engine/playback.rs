//! Transport controls - play, pause, seek, volume, skip, autoplay toggle
//!
//! Commands that make no sense in the current state (play with nothing
//! selected, seek on an empty queue, skip past the last entry) are logged
//! and ignored; they never fail.

use super::core::{AutoplayFetch, PlaybackEngine};
use super::pair::ActiveSlot;
use crate::error::Result;
use segue_common::events::{PlaybackState, QueueChangeTrigger, SegueEvent};
use tracing::{debug, info, warn};

impl PlaybackEngine {
    /// Start or resume the current track
    pub(super) fn play(&mut self) -> Result<()> {
        if self.queue.current().is_none() {
            debug!("Play ignored: nothing selected");
            return Ok(());
        }
        self.play_intent = true;

        if self.awaiting_autoplay() {
            // Continues into the suggestions when they arrive
            return Ok(());
        }

        match &self.sessions.active {
            ActiveSlot::Empty => {
                let start = self.position;
                info!("Play: loading current track at {:.2}s", start);
                self.load_active(start);
                return Ok(());
            }
            ActiveSlot::Loading { .. } => return Ok(()),
            ActiveSlot::Ready(_) => {}
        }

        if self.state == PlaybackState::Playing {
            return Ok(());
        }

        let Some(live) = self.sessions.active_mut() else {
            return Ok(());
        };
        match live.session.play() {
            Ok(()) => {
                info!("Playback resumed");
                self.last_error = None;
                self.set_state(PlaybackState::Playing);
                self.announce_started();
                self.refresh_pending();
            }
            Err(e) => {
                warn!("Resume failed: {}", e);
                self.play_intent = false;
                self.last_error = Some(e.to_string());
                self.shared.broadcast_event(SegueEvent::PlaybackError {
                    track_id: self.queue.current().map(|entry| entry.track.id.clone()),
                    message: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
            }
        }
        Ok(())
    }

    /// Pause the active session at its live position
    ///
    /// A prestarted pending session is rewound and stays warm.
    pub(super) fn pause(&mut self) -> Result<()> {
        self.play_intent = false;

        if let Some(live) = self.sessions.active_mut() {
            self.position = live.session.position();
            live.session.pause();
        }
        self.sessions.demote_prestarted();

        if matches!(self.sessions.active, ActiveSlot::Ready(_)) {
            info!("Playback paused at {:.2}s", self.position);
            self.set_state(PlaybackState::Paused);
        }
        Ok(())
    }

    /// Seek within the current track, clamped to [0, duration]
    pub(super) fn seek_to(&mut self, seconds: f64) -> Result<()> {
        if self.queue.current().is_none() || self.awaiting_autoplay() {
            debug!("Seek ignored: no current track");
            return Ok(());
        }

        let target = seconds.clamp(0.0, self.duration.max(0.0));
        match &mut self.sessions.active {
            ActiveSlot::Ready(live) => live.session.seek_to(target),
            ActiveSlot::Loading { .. } => self.seek_on_arrival = Some(target),
            // Picked up by the next play()
            ActiveSlot::Empty => {}
        }
        self.position = target;
        debug!("Seeked to {:.2}s", target);

        if self.duration - target > self.tuning.prestart_lead_secs {
            self.sessions.demote_prestarted();
        }
        Ok(())
    }

    /// Set process volume (clamped to 0.0-1.0), applied to the active
    /// session only
    pub(super) fn set_volume(&mut self, volume: f32) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        if let Some(live) = self.sessions.active_mut() {
            live.session.set_volume(volume);
        }
        if self.volume == volume {
            return Ok(());
        }

        self.volume = volume;
        debug!("Volume set to {:.2}", volume);
        self.shared.broadcast_event(SegueEvent::VolumeChanged {
            volume,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    pub(super) fn skip_to_next(&mut self) -> Result<()> {
        if self.queue.current().is_none() || self.awaiting_autoplay() {
            debug!("Skip next ignored");
            return Ok(());
        }

        if self.queue.peek_next().is_none() {
            if self.sessions.has_active() && self.request_autoplay(true) {
                info!("Skip at queue end, waiting for autoplay suggestions");
                self.finish_current(false);
                self.sessions.release_pending();
                self.set_state(PlaybackState::Loading);
            } else {
                debug!("Skip next ignored: last track");
            }
            return Ok(());
        }

        if self.sessions.has_active() {
            self.promote(false);
        } else {
            // Nothing loaded yet, just move the selection
            self.sessions.release_pending();
            self.queue.advance();
            self.reset_position();
            self.autoplay = AutoplayFetch::Idle;
            self.emit_queue_changed(QueueChangeTrigger::TrackAdvance);
        }
        Ok(())
    }

    /// Restart the current track near its start, otherwise step back
    pub(super) fn skip_to_previous(&mut self) -> Result<()> {
        if self.queue.current().is_none() {
            debug!("Skip previous ignored: nothing selected");
            return Ok(());
        }

        let waiting = self.awaiting_autoplay();
        if waiting {
            self.autoplay = AutoplayFetch::Idle;
        }
        let engaged = self.sessions.has_active() || waiting;
        let position = self.live_position();
        let at_start = self.queue.current_index() == Some(0);

        if position < self.tuning.restart_threshold_secs || at_start {
            self.restart_current(engaged);
        } else {
            self.step_back(engaged);
        }
        Ok(())
    }

    fn restart_current(&mut self, engaged: bool) {
        info!("Restarting current track");
        self.sessions.release_pending();

        let needs_load = match &mut self.sessions.active {
            ActiveSlot::Ready(live) => {
                live.session.seek_to(0.0);
                false
            }
            ActiveSlot::Loading { .. } => {
                self.seek_on_arrival = Some(0.0);
                false
            }
            ActiveSlot::Empty => engaged,
        };
        self.position = 0.0;

        if needs_load {
            self.load_active(0.0);
        } else {
            self.refresh_pending();
        }
    }

    fn step_back(&mut self, engaged: bool) {
        self.finish_current(false);
        self.sessions.release_pending();
        self.queue.retreat();
        self.reset_position();
        self.autoplay = AutoplayFetch::Idle;

        if let Some(entry) = self.queue.current() {
            info!("Back to {} ({})", entry.track.title, entry.track.id);
        }
        self.emit_queue_changed(QueueChangeTrigger::TrackAdvance);

        if engaged {
            self.load_active(0.0);
        }
    }

    pub(super) fn set_autoplay(&mut self, enabled: bool) -> Result<()> {
        if self.autoplay_enabled == enabled {
            return Ok(());
        }
        info!("Autoplay {}", if enabled { "enabled" } else { "disabled" });
        self.autoplay_enabled = enabled;

        if !enabled {
            let waiting = self.awaiting_autoplay();
            self.autoplay = AutoplayFetch::Idle;
            if waiting {
                self.exhaust();
            }
        }
        Ok(())
    }
}
