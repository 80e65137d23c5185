use std::collections::VecDeque;
use std::convert::Infallible;

use tracing::trace;

use crate::codec::Reading;
use crate::topics;

use super::NodeError;
use super::types::{Node, Publication, Routes};

/// Number of recent samples the sink averages over.
pub const WINDOW: usize = 42;

/// Fixed-capacity FIFO of recent samples, oldest first.
///
/// # Examples
///
/// ```
/// use grid_nodes::nodes::RollingBuffer;
///
/// let mut buffer = RollingBuffer::new(2);
/// buffer.push(10.0);
/// buffer.push(20.0);
/// assert_eq!(buffer.push(30.0), Some(10.0));
/// assert_eq!(buffer.mean(), Some(25.0));
/// ```
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RollingBuffer {
    /// Creates an empty buffer holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample and returns the evicted one when the buffer was full.
    pub fn push(&mut self, sample: f64) -> Option<f64> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Arithmetic mean of the current contents, `None` while empty.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    /// Appends a sample and returns the mean including it.
    pub fn push_and_mean(&mut self, sample: f64) -> f64 {
        self.push(sample);
        self.mean().unwrap_or(sample)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

/// Sink that smooths a chaos sensor with a rolling mean.
///
/// Each measurement on `chaossensor/<id>/data` is appended to a
/// [`WINDOW`]-sized buffer and the mean is republished on `sink/<id>/data`
/// with the measurement's own timestamp.
#[derive(Debug, Clone)]
pub struct AveragingNode {
    id: String,
    buffer: RollingBuffer,
}

impl AveragingNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_window(id, WINDOW)
    }

    pub fn with_window(id: impl Into<String>, window: usize) -> Self {
        Self {
            id: id.into(),
            buffer: RollingBuffer::new(window),
        }
    }

    pub fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }
}

impl Node for AveragingNode {
    type Tick = Reading;
    type Control = Infallible;

    fn routes(&self) -> Routes {
        Routes::new(topics::sensor_data(&self.id))
    }

    fn on_tick(&mut self, tick: &Reading) -> Result<Vec<Publication>, NodeError> {
        let mean = self.buffer.push_and_mean(tick.payload);
        trace!(
            id = %self.id,
            sample = tick.payload,
            mean,
            samples = self.buffer.len(),
            "averaged measurement"
        );

        let reading = Reading::new(mean, tick.timestamp.clone());
        Ok(vec![Publication::new(
            topics::sink_data(&self.id),
            reading.to_json()?,
        )])
    }

    fn on_control(&mut self, update: Infallible) -> Result<(), NodeError> {
        match update {}
    }

    fn node_type(&self) -> &'static str {
        "sink"
    }
}
