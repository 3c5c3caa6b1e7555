//! # Segue Common Library
//!
//! Shared code for the Segue player crates:
//! - Track catalog model
//! - Event types (SegueEvent enum) and the EventBus
//! - Playback and queue enums
//! - Configuration file resolution
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod track;

pub use error::{Error, Result};
pub use track::Track;
