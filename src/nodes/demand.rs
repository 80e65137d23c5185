use chrono::{NaiveTime, Timelike};
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, trace};

use crate::codec::{Reading, ScaleUpdate, Tick};
use crate::tables::LoadProfile;
use crate::tables::profile::SLOT_FORMAT;
use crate::topics;

use super::NodeError;
use super::types::{Node, Publication, Routes, uniform_jitter};

/// Default relative demand jitter.
pub const DEFAULT_JITTER: f64 = 0.05;

/// Minutes covered by one load-profile slot.
pub const SLOT_MINUTES: u32 = 15;

/// Profiles are normalized to 1000 kWh/a; one person is assumed to use 2000 kWh/a.
const PER_PERSON_FACTOR: f64 = 2.0;

/// Truncates a time of day to the start of its quarter-hour slot.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use grid_nodes::nodes::demand::slot_start;
///
/// let t = NaiveTime::from_hms_milli_opt(8, 29, 59, 999).unwrap();
/// assert_eq!(slot_start(t), NaiveTime::from_hms_opt(8, 15, 0).unwrap());
/// ```
pub fn slot_start(time: NaiveTime) -> NaiveTime {
    let minute = time.minute() / SLOT_MINUTES * SLOT_MINUTES;
    NaiveTime::from_hms_opt(time.hour(), minute, 0).unwrap_or(NaiveTime::MIN)
}

/// `HH:MM:SS` label of the slot containing `time`.
pub fn slot_label(time: NaiveTime) -> String {
    slot_start(time).format(SLOT_FORMAT).to_string()
}

/// Consumer demand modeled from a standard load profile.
///
/// On each tick the node looks up the profile coefficient for the tick's
/// quarter-hour slot and publishes
///
/// ```text
/// coefficient * 2 * population_factor * (1 + jitter) * scale_factor
/// ```
///
/// on `<base>/demand`. The scale factor starts at `1.0` and is replaced by
/// every value received on `<base>/scale`.
#[derive(Debug, Clone)]
pub struct DemandNode {
    base_topic: String,
    profile: LoadProfile,
    population_factor: u32,
    scale_factor: f64,
    jitter: f64,
    rng: StdRng,
}

impl DemandNode {
    /// Creates a demand node.
    ///
    /// # Arguments
    ///
    /// * `base_topic` - Topic prefix for the demand output and scale control
    /// * `profile` - Load profile indexed by quarter-hour slot
    /// * `population_factor` - Number of people the consumer represents
    /// * `jitter` - Relative jitter amplitude (`0.0` disables jitter)
    /// * `seed` - Jitter seed; `None` seeds from the operating system
    pub fn new(
        base_topic: impl Into<String>,
        profile: LoadProfile,
        population_factor: u32,
        jitter: f64,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            base_topic: base_topic.into(),
            profile,
            population_factor,
            scale_factor: 1.0,
            jitter: jitter.max(0.0),
            rng,
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Demand for a coefficient with a given jitter draw, using the current scale.
    pub fn demand(&self, coefficient: f64, jitter: f64) -> f64 {
        coefficient
            * PER_PERSON_FACTOR
            * f64::from(self.population_factor)
            * (1.0 + jitter)
            * self.scale_factor
    }
}

impl Node for DemandNode {
    type Tick = Tick;
    type Control = ScaleUpdate;

    fn routes(&self) -> Routes {
        Routes::new(topics::TICK).with_control(topics::scale(&self.base_topic))
    }

    fn on_tick(&mut self, tick: &Tick) -> Result<Vec<Publication>, NodeError> {
        let slot = slot_start(tick.time().time());
        let coefficient = self
            .profile
            .coefficient(slot)
            .ok_or_else(|| NodeError::MissingSlot {
                label: slot.format(SLOT_FORMAT).to_string(),
            })?;

        let jitter = uniform_jitter(&mut self.rng, self.jitter);
        let value = self.demand(coefficient, jitter);
        trace!(
            base = %self.base_topic,
            slot = %slot.format(SLOT_FORMAT),
            coefficient,
            jitter,
            value,
            "computed demand"
        );

        let reading = Reading::new(value, tick.timestamp());
        Ok(vec![Publication::new(
            topics::demand(&self.base_topic),
            reading.to_json()?,
        )])
    }

    fn on_control(&mut self, update: ScaleUpdate) -> Result<(), NodeError> {
        let ScaleUpdate(scale) = update;
        if !scale.is_finite() || scale < 0.0 {
            return Err(NodeError::InvalidScale(scale));
        }
        debug!(base = %self.base_topic, scale, "scale factor updated");
        self.scale_factor = scale;
        Ok(())
    }

    fn node_type(&self) -> &'static str {
        "demand"
    }
}
