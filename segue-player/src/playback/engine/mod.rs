//! Playback engine
//!
//! **Module Structure:**
//! - `core.rs`: Struct, spawning, message loop, session arrival, shared helpers
//! - `pair.rs`: Active/pending session slots
//! - `transition.rs`: Position handling, prestart, promotion, autoplay, exhaustion
//! - `playback.rs`: Transport commands (play, pause, seek, volume, skip)
//! - `queue.rs`: Queue commands (replace, append, insert-next, remove, clear)

mod core;
mod pair;
mod playback;
mod queue;
mod transition;

pub use core::{EngineDeps, PlaybackEngine};
