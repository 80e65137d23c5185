//! Common types and traits for tick-reactive nodes.

use rand::{Rng, rngs::StdRng};

use crate::codec::Decode;

use super::NodeError;

/// A message a node wants published.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Publication {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// A bare decimal setpoint, formatted with at least one fractional digit.
    pub fn setpoint(topic: impl Into<String>, value: f64) -> Self {
        Self::new(topic, format!("{value:?}"))
    }

    /// Payload as text, if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Which handler a subscribed topic feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Tick,
    Control,
}

/// Topics a node listens on, bound to its handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    pub tick: String,
    pub control: Option<String>,
}

impl Routes {
    pub fn new(tick: impl Into<String>) -> Self {
        Self {
            tick: tick.into(),
            control: None,
        }
    }

    pub fn with_control(mut self, control: impl Into<String>) -> Self {
        self.control = Some(control.into());
        self
    }

    /// Resolves an incoming topic to the handler it belongs to.
    pub fn resolve(&self, topic: &str) -> Option<Route> {
        if topic == self.tick {
            Some(Route::Tick)
        } else if self.control.as_deref() == Some(topic) {
            Some(Route::Control)
        } else {
            None
        }
    }

    /// Every topic to subscribe to, tick first.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.tick.as_str()).chain(self.control.as_deref())
    }
}

/// A node that reacts to clock ticks and out-of-band control updates.
///
/// Handlers are called one at a time on the same node, never concurrently.
/// A control update is therefore observed by the next tick only.
pub trait Node {
    /// Event that drives one computation step.
    type Tick: Decode;

    /// Update accepted on the control topic.
    type Control: Decode;

    /// Topics this node listens on.
    fn routes(&self) -> Routes;

    /// Computes the node's output for one tick.
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] if the tick cannot be processed against the
    /// node's tables. The node state is left untouched in that case.
    fn on_tick(&mut self, tick: &Self::Tick) -> Result<Vec<Publication>, NodeError>;

    /// Applies a control update to the node state.
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] if the value is not acceptable. The previous
    /// state is kept in that case.
    fn on_control(&mut self, update: Self::Control) -> Result<(), NodeError>;

    /// Upper bound on the publications a single tick produces.
    fn max_publications(&self) -> usize {
        1
    }

    /// Returns a human-readable type name for the node.
    fn node_type(&self) -> &'static str;
}

/// Draws a relative jitter uniformly from `[-amplitude, amplitude]`.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `amplitude` - Half-width of the interval; non-positive values disable jitter
pub fn uniform_jitter(rng: &mut StdRng, amplitude: f64) -> f64 {
    if amplitude <= 0.0 {
        return 0.0;
    }
    rng.random_range(-amplitude..=amplitude)
}
