//! Tick-reactive nodes for a simulated energy grid on an MQTT bus.

pub mod codec;
pub mod config;
pub mod error;
/// Rolling-average, demand and dispatch nodes.
pub mod nodes;
pub mod runner;
/// Transport event loops and the tick generator.
pub mod runtime;
pub mod tables;
pub mod topics;
