//! Core playback engine - lifecycle and message loop
//!
//! **Responsibilities:**
//! - PlaybackEngine struct definition and spawning
//! - The single-writer message loop (commands, session callbacks, async results)
//! - Session creation requests and their arrival
//! - State/event publication to `SharedState`
//!
//! The engine task owns every piece of mutable playback state. Slow work
//! (stream resolution, session creation, autoplay fetches) runs in spawned
//! tasks that report back through the same channel, so no handler ever
//! blocks on I/O and no two handlers interleave.

use super::pair::{ActiveSlot, LiveSession, PendingSlot, SessionPair};
use crate::config::{EngineTuning, FormatPreference};
use crate::error::{Error, Result};
use crate::playback::autoplay::AutoplaySupplier;
use crate::playback::events::{Command, EngineMessage};
use crate::playback::handle::PlayerHandle;
use crate::playback::metadata::MetadataSink;
use crate::playback::queue_manager::QueueManager;
use crate::playback::session::{
    AudioSession, SessionEvents, SessionFactory, SessionId, SessionRequest, StreamResolver,
};
use crate::state::{PlayerSnapshot, SharedState};
use segue_common::events::{PlaybackState, QueueChangeTrigger, SegueEvent};
use segue_common::Track;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Collaborators injected into the engine
#[derive(Clone)]
pub struct EngineDeps {
    pub factory: Arc<dyn SessionFactory>,
    pub resolver: Arc<dyn StreamResolver>,

    /// `None` disables autoplay regardless of the toggle
    pub supplier: Option<Arc<dyn AutoplaySupplier>>,

    pub metadata: Arc<dyn MetadataSink>,
}

/// Autoplay fetch bookkeeping, keyed by the queue entry that was current
/// when the fetch was issued
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum AutoplayFetch {
    Idle,
    InFlight {
        entry_id: Uuid,
        /// The current track already ended; advance when results arrive
        continue_on_arrival: bool,
    },
    /// Answered (possibly empty); not fetched again for this entry
    Settled { entry_id: Uuid },
}

/// Playback engine - owns the queue and the session pair
pub struct PlaybackEngine {
    pub(super) deps: EngineDeps,
    pub(super) tuning: EngineTuning,
    pub(super) format: FormatPreference,

    /// Shared state (snapshot + event bus)
    pub(super) shared: Arc<SharedState>,

    /// Sender half of the engine's own channel, cloned into spawned work
    pub(super) tx: mpsc::UnboundedSender<EngineMessage>,

    pub(super) queue: QueueManager,
    pub(super) sessions: SessionPair,

    pub(super) state: PlaybackState,
    pub(super) position: f64,
    pub(super) duration: f64,

    /// Process volume; applied to the active session only
    pub(super) volume: f32,

    pub(super) last_error: Option<String>,
    pub(super) autoplay_enabled: bool,
    pub(super) autoplay: AutoplayFetch,

    /// Whether the consumer wants audio (survives loads and waits)
    pub(super) play_intent: bool,

    /// Seek requested while the active session was still loading
    pub(super) seek_on_arrival: Option<f64>,

    /// Entry for which TrackStarted was emitted
    pub(super) announced: Option<Uuid>,

    next_session_id: u64,
}

impl PlaybackEngine {
    /// Spawn the engine task
    ///
    /// Returns the consumer handle and the task's JoinHandle. The task runs
    /// until `PlayerHandle::shutdown` is called.
    pub fn spawn(
        deps: EngineDeps,
        tuning: EngineTuning,
        format: FormatPreference,
    ) -> Result<(PlayerHandle, JoinHandle<()>)> {
        tuning.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let initial = PlayerSnapshot {
            volume: tuning.initial_volume,
            autoplay_enabled: tuning.autoplay_enabled,
            ..PlayerSnapshot::default()
        };
        let shared = Arc::new(SharedState::new(tuning.event_capacity, initial));

        let engine = Self {
            deps,
            volume: tuning.initial_volume,
            autoplay_enabled: tuning.autoplay_enabled,
            tuning,
            format,
            shared: Arc::clone(&shared),
            tx: tx.clone(),
            queue: QueueManager::new(),
            sessions: SessionPair::new(),
            state: PlaybackState::Idle,
            position: 0.0,
            duration: 0.0,
            last_error: None,
            autoplay: AutoplayFetch::Idle,
            play_intent: false,
            seek_on_arrival: None,
            announced: None,
            next_session_id: 0,
        };

        let task = tokio::spawn(engine.run(rx));
        Ok((PlayerHandle::new(tx, shared), task))
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<EngineMessage>) {
        info!(
            "Playback engine started (volume {:.2}, autoplay {})",
            self.volume, self.autoplay_enabled
        );

        while let Some(message) = rx.recv().await {
            let flow = self.handle_message(message);
            let snapshot = self.build_snapshot();
            self.shared.set_snapshot(snapshot).await;
            if flow.is_break() {
                break;
            }
        }

        self.sessions.release_all();
        info!("Playback engine stopped");
    }

    fn handle_message(&mut self, message: EngineMessage) -> ControlFlow<()> {
        match message {
            EngineMessage::Command { command, reply } => {
                if matches!(command, Command::Shutdown) {
                    info!("Shutdown requested");
                    self.finish_current(false);
                    self.sessions.release_all();
                    self.set_state(PlaybackState::Idle);
                    let _ = reply.send(Ok(()));
                    return ControlFlow::Break(());
                }
                let result = self.dispatch(command);
                let _ = reply.send(result);
            }
            EngineMessage::Snapshot { reply } => {
                let _ = reply.send(self.build_snapshot());
            }
            EngineMessage::Session(event) => self.on_session_event(event),
            EngineMessage::SessionReady { session_id, result } => {
                self.on_session_ready(session_id, result)
            }
            EngineMessage::AutoplayFetched {
                entry_id,
                seed_track_id,
                result,
            } => self.on_autoplay_fetched(entry_id, seed_track_id, result),
        }
        ControlFlow::Continue(())
    }

    fn dispatch(&mut self, command: Command) -> Result<()> {
        debug!("Command: {}", command.name());
        match command {
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::SeekTo(seconds) => self.seek_to(seconds),
            Command::SetVolume(volume) => self.set_volume(volume),
            Command::SetQueue {
                tracks,
                start_index,
            } => self.set_queue(tracks, start_index),
            Command::PlayTrack { track, queue } => self.play_track(track, queue),
            Command::AddToQueue(tracks) => self.add_to_queue(tracks),
            Command::PlayNext(tracks) => self.play_next(tracks),
            Command::RemoveFromQueue(entry_id) => self.remove_from_queue(entry_id),
            Command::ClearQueue => self.clear_queue(),
            Command::SkipToNext => self.skip_to_next(),
            Command::SkipToPrevious => self.skip_to_previous(),
            Command::SetAutoplay(enabled) => self.set_autoplay(enabled),
            // Handled before dispatch
            Command::Shutdown => Ok(()),
        }
    }

    // ========================================
    // Session creation
    // ========================================

    /// Start creating a session for `track` in the background
    ///
    /// The result arrives later as `EngineMessage::SessionReady` carrying the
    /// returned id; whoever holds that id in a slot at that time gets it.
    pub(super) fn request_session(
        &mut self,
        track: Track,
        start_position: f64,
        start_muted: bool,
    ) -> SessionId {
        self.next_session_id += 1;
        let session_id = SessionId(self.next_session_id);

        debug!(
            "Requesting {} for {} at {:.2}s (muted: {})",
            session_id, track.id, start_position, start_muted
        );

        let factory = Arc::clone(&self.deps.factory);
        let resolver = Arc::clone(&self.deps.resolver);
        let format = self.format.clone();
        let events = SessionEvents::new(session_id, self.tx.clone());
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let result = async {
                let uri = resolver.resolve(&track, &format).await?;
                factory
                    .create(
                        SessionRequest {
                            uri,
                            track,
                            start_position,
                            start_muted,
                        },
                        events,
                    )
                    .await
            }
            .await;
            let _ = tx.send(EngineMessage::SessionReady { session_id, result });
        });

        session_id
    }

    pub(super) fn on_session_ready(
        &mut self,
        session_id: SessionId,
        result: Result<Box<dyn AudioSession>>,
    ) {
        if self.sessions.active_loading_id() == Some(session_id) {
            let ActiveSlot::Loading { entry_id, .. } = self.sessions.take_active() else {
                return;
            };
            match result {
                Ok(session) => {
                    debug!("Active {} ready", session_id);
                    self.install_active(
                        LiveSession {
                            id: session_id,
                            entry_id,
                            session,
                        },
                        false,
                    );
                }
                Err(e) => self.fail_load(e),
            }
            return;
        }

        if self.sessions.pending_loading_id() == Some(session_id) {
            let PendingSlot::Loading { entry_id, .. } = self.sessions.take_pending() else {
                return;
            };
            match result {
                Ok(mut session) => {
                    session.set_volume(0.0);
                    debug!("Pending {} warm for entry {}", session_id, entry_id);
                    self.sessions.pending = PendingSlot::Warm(LiveSession {
                        id: session_id,
                        entry_id,
                        session,
                    });
                }
                // Promotion falls back to a fresh load
                Err(e) => warn!("Pending {} failed to load: {}", session_id, e),
            }
            return;
        }

        match result {
            Ok(session) => {
                debug!("Releasing stale {}", session_id);
                session.release();
            }
            Err(e) => debug!("Stale {} failed to load: {}", session_id, e),
        }
    }

    /// Make `live` the active session and apply play intent
    ///
    /// `rewind` seeks to 0 first (a prestarted session taken over by a skip
    /// has already run ahead).
    pub(super) fn install_active(&mut self, mut live: LiveSession, rewind: bool) {
        if rewind {
            live.session.seek_to(0.0);
        }
        if let Some(target) = self.seek_on_arrival.take() {
            live.session.seek_to(target);
        }
        live.session.set_volume(self.volume);

        if self.play_intent {
            if let Err(e) = live.session.play() {
                live.release();
                self.fail_load(e);
                return;
            }
            self.sessions.active = ActiveSlot::Ready(live);
            self.last_error = None;
            self.set_state(PlaybackState::Playing);
            self.announce_started();
        } else {
            live.session.pause();
            self.sessions.active = ActiveSlot::Ready(live);
            self.last_error = None;
            self.set_state(PlaybackState::Paused);
        }

        self.refresh_pending();
    }

    /// Load failure: release everything, keep the cursor, surface the error
    pub(super) fn fail_load(&mut self, err: Error) {
        let track_id = self.queue.current().map(|e| e.track.id.clone());
        error!(
            "Failed to load {}: {}",
            track_id.as_deref().unwrap_or("<none>"),
            err
        );

        self.sessions.release_all();
        self.play_intent = false;
        self.seek_on_arrival = None;
        self.last_error = Some(err.to_string());

        self.shared.broadcast_event(SegueEvent::PlaybackError {
            track_id,
            message: err.to_string(),
            timestamp: chrono::Utc::now(),
        });
        self.set_state(PlaybackState::Idle);
    }

    // ========================================
    // Shared helpers
    // ========================================

    pub(super) fn set_state(&mut self, new_state: PlaybackState) {
        if self.state == new_state {
            return;
        }
        let old_state = std::mem::replace(&mut self.state, new_state);
        info!("Playback state: {} -> {}", old_state, new_state);

        self.shared.broadcast_event(SegueEvent::PlaybackStateChanged {
            old_state,
            new_state,
            timestamp: chrono::Utc::now(),
        });
    }

    pub(super) fn emit_queue_changed(&self, trigger: QueueChangeTrigger) {
        self.shared.broadcast_event(SegueEvent::QueueChanged {
            queue: self.queue.entry_ids(),
            current_index: self.queue.current_index(),
            autoplay_boundary: self.queue.autoplay_boundary(),
            trigger,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Emit TrackStarted and publish metadata once per entry
    pub(super) fn announce_started(&mut self) {
        let Some(entry) = self.queue.current() else {
            return;
        };
        if self.announced == Some(entry.entry_id) {
            return;
        }
        self.announced = Some(entry.entry_id);

        info!("Track started: {} ({})", entry.track.title, entry.track.id);
        self.deps.metadata.publish(Some(&entry.track));
        self.shared.broadcast_event(SegueEvent::TrackStarted {
            entry_id: entry.entry_id,
            track_id: entry.track.id.clone(),
            queue_index: self.queue.current_index().unwrap_or(0),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Release the active session; emit TrackCompleted if it was announced
    pub(super) fn finish_current(&mut self, completed: bool) {
        if !self.sessions.has_active() {
            return;
        }
        let position = self.live_position();
        self.sessions.release_active();

        if let Some(entry) = self.queue.current() {
            if self.announced == Some(entry.entry_id) {
                self.shared.broadcast_event(SegueEvent::TrackCompleted {
                    entry_id: entry.entry_id,
                    track_id: entry.track.id.clone(),
                    position,
                    completed,
                    timestamp: chrono::Utc::now(),
                });
            }
        }
        self.announced = None;
    }

    pub(super) fn live_position(&self) -> f64 {
        match &self.sessions.active {
            ActiveSlot::Ready(live) => live.session.position(),
            _ => self.position,
        }
    }

    /// Position 0 and nominal duration of the (new) current track
    pub(super) fn reset_position(&mut self) {
        self.position = 0.0;
        self.duration = self
            .queue
            .current()
            .map_or(0.0, |e| e.track.duration_seconds);
        self.seek_on_arrival = None;
    }

    pub(super) fn build_snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            queue: self.queue.entries().to_vec(),
            current_index: self.queue.current_index(),
            current_track: self.queue.current().map(|e| e.track.clone()),
            state: self.state,
            is_playing: self.state.is_playing(),
            is_loading: self.state == PlaybackState::Loading,
            position: self.position,
            duration: self.duration,
            volume: self.volume,
            last_error: self.last_error.clone(),
            autoplay_boundary: self.queue.autoplay_boundary(),
            autoplay_enabled: self.autoplay_enabled,
            pending_phase: self.sessions.pending.phase(),
            pending_entry_id: self.sessions.pending.entry_id(),
            active_session_id: self.sessions.active_id(),
            pending_session_id: self.sessions.pending.session_id(),
        }
    }
}
