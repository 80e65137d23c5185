//! Event loops that connect nodes to the message bus.

/// Simulation clock for the tick generator.
pub mod clock;
pub mod mqtt;
/// Topic-to-handler dispatch.
pub mod router;
pub mod tickgen;

pub use mqtt::run_node;
pub use router::Router;
pub use tickgen::run_tickgen;
