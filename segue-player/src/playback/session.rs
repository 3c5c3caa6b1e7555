//! Audio session abstraction
//!
//! A session is one platform player instance bound to one stream. The engine
//! owns at most two live sessions (active + pending) and never talks to a
//! platform API directly; backends implement the traits below.
//!
//! Callbacks from a session are delivered as messages tagged with the
//! session's `SessionId`, so a callback from a released or replaced session
//! can always be recognised and ignored.

use crate::config::FormatPreference;
use crate::error::Result;
use crate::playback::events::{EngineMessage, SessionEvent};
use async_trait::async_trait;
use segue_common::Track;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;

/// Generation counter identifying one session instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(pub(crate) u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Parameters for creating a session
#[derive(Debug, Clone)]
pub struct SessionRequest {
    /// Resolved stream URI
    pub uri: String,

    /// Track being loaded (backends may use its nominal duration)
    pub track: Track,

    /// Seconds into the stream to start from
    pub start_position: f64,

    /// Pending sessions are created at volume 0
    pub start_muted: bool,
}

/// Callback sink handed to a backend at creation time
///
/// Cheap to clone. Sends never block; a closed engine is silently ignored.
#[derive(Clone)]
pub struct SessionEvents {
    session_id: SessionId,
    tx: mpsc::UnboundedSender<EngineMessage>,
}

impl SessionEvents {
    pub(crate) fn new(session_id: SessionId, tx: mpsc::UnboundedSender<EngineMessage>) -> Self {
        Self { session_id, tx }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Report playback position (seconds) and the stream's duration
    pub fn position(&self, position: f64, duration: f64) {
        let _ = self.tx.send(EngineMessage::Session(SessionEvent::Position {
            session_id: self.session_id,
            position,
            duration,
        }));
    }

    /// Report that the stream reached its natural end
    pub fn finished(&self) {
        let _ = self.tx.send(EngineMessage::Session(SessionEvent::Finished {
            session_id: self.session_id,
        }));
    }
}

/// One live platform player instance
///
/// All methods are called from the engine task only.
pub trait AudioSession: Send {
    /// Start or resume playback
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Jump to `seconds` into the stream
    fn seek_to(&mut self, seconds: f64);

    /// Per-session volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);

    /// Live position in seconds
    fn position(&self) -> f64;

    /// Stop and free the underlying resources. No callbacks are expected
    /// afterwards, but any that arrive are ignored by the engine.
    fn release(self: Box<Self>);
}

/// Creates sessions for resolved streams
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Create a session ready to play at `request.start_position`
    ///
    /// The session must not start playing on its own.
    async fn create(
        &self,
        request: SessionRequest,
        events: SessionEvents,
    ) -> Result<Box<dyn AudioSession>>;
}

/// Maps a track to a playable stream URI
#[async_trait]
pub trait StreamResolver: Send + Sync {
    async fn resolve(&self, track: &Track, format: &FormatPreference) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_events_are_tagged() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = SessionEvents::new(SessionId(7), tx);

        events.position(1.5, 30.0);
        events.finished();

        match rx.recv().await.unwrap() {
            EngineMessage::Session(SessionEvent::Position {
                session_id,
                position,
                duration,
            }) => {
                assert_eq!(session_id, SessionId(7));
                assert_eq!(position, 1.5);
                assert_eq!(duration, 30.0);
            }
            _ => panic!("expected position event"),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            EngineMessage::Session(SessionEvent::Finished { session_id }) if session_id == SessionId(7)
        ));
    }

    #[test]
    fn test_send_after_engine_gone_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let events = SessionEvents::new(SessionId(1), tx);
        events.position(0.0, 1.0);
        events.finished();
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId(3).to_string(), "session#3");
    }
}
