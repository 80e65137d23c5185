use tracing::{debug, trace};

use crate::codec::{ModeUpdate, Tick};
use crate::tables::Schedule;
use crate::topics;

use super::NodeError;
use super::types::{Node, Publication, Routes};

/// Scheduler that dispatches producers from an hourly plan.
///
/// While managed mode is on (the default), every tick publishes one setpoint
/// per producer, `rated_power * percentage / 100`, to the producer's own
/// topic. With managed mode off ticks are ignored. The mode is switched on
/// `<base>/schedule_mode`.
#[derive(Debug, Clone)]
pub struct DispatchNode {
    base_topic: String,
    schedule: Schedule,
    managed: bool,
}

impl DispatchNode {
    pub fn new(base_topic: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            base_topic: base_topic.into(),
            schedule,
            managed: true,
        }
    }

    pub fn is_managed(&self) -> bool {
        self.managed
    }
}

impl Node for DispatchNode {
    type Tick = Tick;
    type Control = ModeUpdate;

    fn routes(&self) -> Routes {
        Routes::new(topics::TICK).with_control(topics::schedule_mode(&self.base_topic))
    }

    fn on_tick(&mut self, tick: &Tick) -> Result<Vec<Publication>, NodeError> {
        if !self.managed {
            trace!(base = %self.base_topic, "unmanaged, skipping tick");
            return Ok(Vec::new());
        }

        let hour = tick.hour();
        let setpoints = self
            .schedule
            .setpoints(hour)
            .ok_or(NodeError::HourOutOfRange { hour })?;

        Ok(setpoints
            .into_iter()
            .map(|(producer, value)| {
                trace!(producer, value, hour, "dispatching");
                Publication::setpoint(producer, value)
            })
            .collect())
    }

    fn on_control(&mut self, update: ModeUpdate) -> Result<(), NodeError> {
        debug!(base = %self.base_topic, managed = update.managed, "schedule mode updated");
        self.managed = update.managed;
        Ok(())
    }

    fn max_publications(&self) -> usize {
        self.schedule.producers().len()
    }

    fn node_type(&self) -> &'static str {
        "dispatch"
    }
}
