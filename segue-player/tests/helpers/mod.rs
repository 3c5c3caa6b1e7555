//! Test helpers for segue-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - MockSessionFactory: records every session it creates and lets tests
//!   fire position/finish callbacks on them
//! - ScriptedSupplier: autoplay supplier with canned replies
//! - RecordingMetadataSink: remembers every now-playing publish
//! - TestPlayer: engine wired to the mocks, plus polling helpers

#![allow(dead_code)]

use async_trait::async_trait;
use segue_common::events::{PlaybackState, SegueEvent};
use segue_common::Track;
use segue_player::config::{EngineTuning, FormatPreference};
use segue_player::error::{Error, Result};
use segue_player::playback::{
    AudioSession, AutoplaySupplier, EngineDeps, MetadataSink, PlaybackEngine, PlayerHandle,
    SessionEvents, SessionFactory, SessionId, SessionRequest, StreamResolver,
};
use segue_player::{PendingPhase, PlayerSnapshot};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Default polling deadline
pub const WAIT: Duration = Duration::from_secs(2);

/// 30 second track
pub fn track(id: &str) -> Track {
    Track::new(id, format!("Track {}", id.to_uppercase()), 30.0)
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

// ========================================
// Mock sessions
// ========================================

#[derive(Debug, Default, Clone)]
pub struct MockState {
    pub playing: bool,
    pub position: f64,
    pub volume: f32,
    pub released: bool,
    pub play_calls: usize,
    pub seeks: Vec<f64>,
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
}

impl AudioSession for MockSession {
    fn play(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.playing = true;
        state.play_calls += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().playing = false;
    }

    fn seek_to(&mut self, seconds: f64) {
        let mut state = self.state.lock().unwrap();
        state.position = seconds;
        state.seeks.push(seconds);
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().unwrap().volume = volume;
    }

    fn position(&self) -> f64 {
        self.state.lock().unwrap().position
    }

    fn release(self: Box<Self>) {
        let mut state = self.state.lock().unwrap();
        state.released = true;
        state.playing = false;
    }
}

/// Everything known about one created session
#[derive(Clone)]
pub struct SessionRecord {
    pub id: SessionId,
    pub track_id: String,
    pub uri: String,
    pub start_position: f64,
    pub start_muted: bool,
    pub duration: f64,
    state: Arc<Mutex<MockState>>,
    events: SessionEvents,
}

impl SessionRecord {
    pub fn state(&self) -> MockState {
        self.state.lock().unwrap().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing
    }

    pub fn is_released(&self) -> bool {
        self.state().released
    }

    pub fn volume(&self) -> f32 {
        self.state().volume
    }

    /// Move the mock clock and report it to the engine
    pub fn emit_position(&self, position: f64) {
        self.state.lock().unwrap().position = position;
        self.events.position(position, self.duration);
    }

    pub fn finish(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.position = self.duration;
            state.playing = false;
        }
        self.events.finished();
    }
}

#[derive(Default)]
pub struct MockSessionFactory {
    records: Mutex<Vec<SessionRecord>>,
    attempts: Mutex<HashMap<String, usize>>,
    failing: Mutex<HashSet<String>>,
    fail_once: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl MockSessionFactory {
    /// Every creation for `track_id` fails until `allow`
    pub fn fail(&self, track_id: &str) {
        self.failing.lock().unwrap().insert(track_id.to_string());
    }

    pub fn allow(&self, track_id: &str) {
        self.failing.lock().unwrap().remove(track_id);
    }

    /// Next creation for `track_id` fails
    pub fn fail_once(&self, track_id: &str) {
        self.fail_once.lock().unwrap().insert(track_id.to_string());
    }

    /// Creation for `track_id` takes `delay`
    pub fn delay(&self, track_id: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(track_id.to_string(), delay);
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn record(&self, id: SessionId) -> Option<SessionRecord> {
        self.records().into_iter().find(|r| r.id == id)
    }

    pub fn sessions_for(&self, track_id: &str) -> Vec<SessionRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.track_id == track_id)
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.records().iter().filter(|r| !r.is_released()).count()
    }

    pub fn attempts(&self, track_id: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .get(track_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn create(
        &self,
        request: SessionRequest,
        events: SessionEvents,
    ) -> Result<Box<dyn AudioSession>> {
        let track_id = request.track.id.clone();
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(track_id.clone())
            .or_default() += 1;

        let delay = self.delays.lock().unwrap().get(&track_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let fails = self.failing.lock().unwrap().contains(&track_id)
            || self.fail_once.lock().unwrap().remove(&track_id);
        if fails {
            return Err(Error::Load(format!("mock failure for {}", track_id)));
        }

        let state = Arc::new(Mutex::new(MockState {
            position: request.start_position,
            volume: if request.start_muted { 0.0 } else { 1.0 },
            ..MockState::default()
        }));

        self.records.lock().unwrap().push(SessionRecord {
            id: events.session_id(),
            track_id,
            uri: request.uri,
            start_position: request.start_position,
            start_muted: request.start_muted,
            duration: request.track.duration_seconds,
            state: Arc::clone(&state),
            events,
        });

        Ok(Box::new(MockSession { state }))
    }
}

pub struct MockResolver;

#[async_trait]
impl StreamResolver for MockResolver {
    async fn resolve(&self, track: &Track, _format: &FormatPreference) -> Result<String> {
        Ok(format!("mock://{}", track.id))
    }
}

// ========================================
// Autoplay supplier
// ========================================

pub enum Reply {
    Tracks(Vec<Track>),
    Fail,
}

pub struct ScriptedSupplier {
    replies: Mutex<VecDeque<Reply>>,
    delay: Duration,
    calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedSupplier {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self::with_delay(replies, Duration::ZERO)
    }

    pub fn with_delay(replies: Vec<Reply>, delay: Duration) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            delay,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// (seed track id, limit) per call
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AutoplaySupplier for ScriptedSupplier {
    async fn fetch_similar(&self, track_id: &str, limit: usize) -> Result<Vec<Track>> {
        self.calls
            .lock()
            .unwrap()
            .push((track_id.to_string(), limit));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Tracks(tracks)) => Ok(tracks),
            Some(Reply::Fail) => Err(Error::Supplier("scripted failure".to_string())),
            None => Ok(Vec::new()),
        }
    }
}

// ========================================
// Metadata sink
// ========================================

#[derive(Default)]
pub struct RecordingMetadataSink {
    published: Mutex<Vec<Option<String>>>,
}

impl RecordingMetadataSink {
    /// Track ids published, `None` for clears
    pub fn published(&self) -> Vec<Option<String>> {
        self.published.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Option<String>> {
        self.published().last().cloned()
    }
}

impl MetadataSink for RecordingMetadataSink {
    fn publish(&self, track: Option<&Track>) {
        self.published
            .lock()
            .unwrap()
            .push(track.map(|t| t.id.clone()));
    }
}

// ========================================
// Engine harness
// ========================================

pub struct TestPlayer {
    pub handle: PlayerHandle,
    pub factory: Arc<MockSessionFactory>,
    pub metadata: Arc<RecordingMetadataSink>,
    pub events: broadcast::Receiver<SegueEvent>,
    task: JoinHandle<()>,
}

impl TestPlayer {
    pub fn start(tuning: EngineTuning, supplier: Option<Arc<ScriptedSupplier>>) -> Self {
        let factory = Arc::new(MockSessionFactory::default());
        let metadata = Arc::new(RecordingMetadataSink::default());

        let deps = EngineDeps {
            factory: Arc::clone(&factory) as Arc<dyn SessionFactory>,
            resolver: Arc::new(MockResolver),
            supplier: supplier.map(|s| s as Arc<dyn AutoplaySupplier>),
            metadata: Arc::clone(&metadata) as Arc<dyn MetadataSink>,
        };

        let (handle, task) =
            PlaybackEngine::spawn(deps, tuning, FormatPreference::Original).unwrap();
        let events = handle.subscribe();

        Self {
            handle,
            factory,
            metadata,
            events,
            task,
        }
    }

    pub fn with_defaults() -> Self {
        Self::start(EngineTuning::default(), None)
    }

    pub fn with_autoplay(supplier: Arc<ScriptedSupplier>) -> Self {
        let tuning = EngineTuning {
            autoplay_enabled: true,
            ..EngineTuning::default()
        };
        Self::start(tuning, Some(supplier))
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        self.handle.snapshot().await.unwrap()
    }

    /// Poll engine snapshots until `predicate` holds
    pub async fn wait_until<F>(&self, what: &str, predicate: F) -> PlayerSnapshot
    where
        F: Fn(&PlayerSnapshot) -> bool,
    {
        let result = timeout(WAIT, async {
            loop {
                let snapshot = self.snapshot().await;
                if predicate(&snapshot) {
                    return snapshot;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;

        match result {
            Ok(snapshot) => snapshot,
            Err(_) => panic!(
                "Timed out waiting for {}: {:?}",
                what,
                self.snapshot().await
            ),
        }
    }

    /// Poll the mock factory until `predicate` holds
    pub async fn wait_for_factory<F>(&self, what: &str, predicate: F)
    where
        F: Fn(&MockSessionFactory) -> bool,
    {
        let result = timeout(WAIT, async {
            while !predicate(&self.factory) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(result.is_ok(), "Timed out waiting for {}", what);
    }

    /// Record of the session currently in the active slot
    pub async fn active(&self) -> SessionRecord {
        let snapshot = self.snapshot().await;
        let id = snapshot.active_session_id.expect("no active session");
        self.factory.record(id).expect("active session not created")
    }

    /// Record of the session currently in the pending slot
    pub async fn pending(&self) -> SessionRecord {
        let snapshot = self.snapshot().await;
        let id = snapshot.pending_session_id.expect("no pending session");
        self.factory.record(id).expect("pending session not created")
    }

    /// Queue `ids`, play, and wait until the active session plays and the
    /// pending one (if any) is warm
    pub async fn start_playing(&self, ids: &[&str]) -> SessionRecord {
        self.handle.set_queue(tracks(ids), 0).await.unwrap();
        self.handle.play().await.unwrap();
        self.wait_until("playing with warm pending", |s| {
            s.state == PlaybackState::Playing
                && (s.queue.len() < 2 || s.pending_phase == PendingPhase::Warm)
        })
        .await;
        self.active().await
    }

    /// Drive `active` into the prestart window and return the prestarted
    /// pending session
    pub async fn prestart_next(&self, active: &SessionRecord) -> SessionRecord {
        active.emit_position(active.duration - 0.3);
        let snapshot = self.snapshot().await;
        assert_eq!(snapshot.pending_phase, PendingPhase::Prestarted);
        let pending = self.pending().await;
        assert!(pending.is_playing());
        pending
    }

    /// Wait until the pending slot holds a warm session for the entry
    /// right after the cursor
    pub async fn wait_for_next_warm(&self, what: &str) -> PlayerSnapshot {
        self.wait_until(what, |s| {
            let next = s.current_index.and_then(|i| s.queue.get(i + 1));
            s.pending_phase == PendingPhase::Warm
                && next.is_some()
                && s.pending_entry_id == next.map(|e| e.entry_id)
        })
        .await
    }

    /// Events received so far
    pub fn drain_events(&mut self) -> Vec<SegueEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub async fn shutdown(self) {
        self.handle.shutdown().await.unwrap();
        self.task.await.unwrap();
    }
}
