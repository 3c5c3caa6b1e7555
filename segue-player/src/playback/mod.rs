//! Playback engine, queue and collaborator seams

pub mod autoplay;
pub mod engine;
pub mod events;
pub mod handle;
pub mod metadata;
pub mod queue_manager;
pub mod session;

pub use autoplay::{AutoplaySupplier, CatalogSupplier};
pub use engine::{EngineDeps, PlaybackEngine};
pub use handle::PlayerHandle;
pub use metadata::{LoggingMetadataSink, MetadataSink};
pub use queue_manager::{QueueEntry, QueueManager};
pub use session::{
    AudioSession, SessionEvents, SessionFactory, SessionId, SessionRequest, StreamResolver,
};
