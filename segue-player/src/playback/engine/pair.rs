//! Active/pending session pair
//!
//! At most two live sessions exist: the active one (the audible current
//! track) and the pending one (bound to the queue entry right after the
//! current one). Creation is asynchronous, so each slot can also be waiting
//! for a session that has not arrived yet.

use crate::playback::session::{AudioSession, SessionId};
use crate::state::PendingPhase;
use std::mem;
use tracing::debug;
use uuid::Uuid;

/// A created session bound to one queue entry
pub(super) struct LiveSession {
    pub(super) id: SessionId,
    pub(super) entry_id: Uuid,
    pub(super) session: Box<dyn AudioSession>,
}

impl LiveSession {
    pub(super) fn release(self) {
        debug!("Releasing {} (entry {})", self.id, self.entry_id);
        self.session.release();
    }
}

pub(super) enum ActiveSlot {
    Empty,
    /// Creation in flight
    Loading { id: SessionId, entry_id: Uuid },
    Ready(LiveSession),
}

pub(super) enum PendingSlot {
    Cold,
    Loading { id: SessionId, entry_id: Uuid },
    /// Created at volume 0, not playing
    Warm(LiveSession),
    /// Playing at volume 0 alongside the active session
    Prestarted(LiveSession),
}

impl PendingSlot {
    pub(super) fn phase(&self) -> PendingPhase {
        match self {
            PendingSlot::Cold => PendingPhase::Cold,
            PendingSlot::Loading { .. } => PendingPhase::Loading,
            PendingSlot::Warm(_) => PendingPhase::Warm,
            PendingSlot::Prestarted(_) => PendingPhase::Prestarted,
        }
    }

    pub(super) fn entry_id(&self) -> Option<Uuid> {
        match self {
            PendingSlot::Cold => None,
            PendingSlot::Loading { entry_id, .. } => Some(*entry_id),
            PendingSlot::Warm(live) | PendingSlot::Prestarted(live) => Some(live.entry_id),
        }
    }

    pub(super) fn session_id(&self) -> Option<SessionId> {
        match self {
            PendingSlot::Cold => None,
            PendingSlot::Loading { id, .. } => Some(*id),
            PendingSlot::Warm(live) | PendingSlot::Prestarted(live) => Some(live.id),
        }
    }

    pub(super) fn release(self) {
        match self {
            PendingSlot::Warm(live) | PendingSlot::Prestarted(live) => live.release(),
            // A late arrival is released when it shows up
            PendingSlot::Loading { .. } | PendingSlot::Cold => {}
        }
    }
}

pub(super) struct SessionPair {
    pub(super) active: ActiveSlot,
    pub(super) pending: PendingSlot,
}

impl SessionPair {
    pub(super) fn new() -> Self {
        Self {
            active: ActiveSlot::Empty,
            pending: PendingSlot::Cold,
        }
    }

    /// Id of the active session if it is live (events from anything else
    /// are ignored)
    pub(super) fn live_active_id(&self) -> Option<SessionId> {
        match &self.active {
            ActiveSlot::Ready(live) => Some(live.id),
            _ => None,
        }
    }

    /// Id of the active session, loading or live
    pub(super) fn active_id(&self) -> Option<SessionId> {
        match &self.active {
            ActiveSlot::Empty => None,
            ActiveSlot::Loading { id, .. } => Some(*id),
            ActiveSlot::Ready(live) => Some(live.id),
        }
    }

    pub(super) fn active_mut(&mut self) -> Option<&mut LiveSession> {
        match &mut self.active {
            ActiveSlot::Ready(live) => Some(live),
            _ => None,
        }
    }

    pub(super) fn active_loading_id(&self) -> Option<SessionId> {
        match &self.active {
            ActiveSlot::Loading { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub(super) fn pending_loading_id(&self) -> Option<SessionId> {
        match &self.pending {
            PendingSlot::Loading { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub(super) fn has_active(&self) -> bool {
        !matches!(self.active, ActiveSlot::Empty)
    }

    pub(super) fn take_active(&mut self) -> ActiveSlot {
        mem::replace(&mut self.active, ActiveSlot::Empty)
    }

    pub(super) fn take_pending(&mut self) -> PendingSlot {
        mem::replace(&mut self.pending, PendingSlot::Cold)
    }

    pub(super) fn release_active(&mut self) {
        if let ActiveSlot::Ready(live) = self.take_active() {
            live.release();
        }
    }

    pub(super) fn release_pending(&mut self) {
        self.take_pending().release();
    }

    pub(super) fn release_all(&mut self) {
        self.release_active();
        self.release_pending();
    }

    /// Pause a prestarted pending session and rewind it, back to warm
    pub(super) fn demote_prestarted(&mut self) {
        self.pending = match self.take_pending() {
            PendingSlot::Prestarted(mut live) => {
                live.session.pause();
                live.session.seek_to(0.0);
                debug!("{} returned to warm", live.id);
                PendingSlot::Warm(live)
            }
            other => other,
        };
    }
}
