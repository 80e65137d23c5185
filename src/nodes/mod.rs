//! Tick-reactive grid nodes.

/// Rolling-average sink over a chaos sensor.
pub mod averaging;
/// Load-profile driven consumer demand.
pub mod demand;
/// Hourly producer dispatch from a schedule.
pub mod dispatch;
pub mod error;
pub mod types;

// Re-export the main types for convenience
pub use averaging::{AveragingNode, RollingBuffer};
pub use demand::DemandNode;
pub use dispatch::DispatchNode;
pub use error::NodeError;
pub use types::{Node, Publication, Route, Routes};
