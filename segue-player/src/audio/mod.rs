//! Audio backends
//!
//! Implementations of the session and resolver seams. Platform players live
//! outside this crate; the simulated backend runs sessions on a clock.

pub mod resolver;
pub mod simulated;

pub use resolver::TemplateResolver;
pub use simulated::SimulatedSessionFactory;
