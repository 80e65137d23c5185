//! Tick generator process.

use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta, Timelike, Utc};
use rumqttc::{Event, Packet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::codec::Tick;
use crate::config::{BrokerConfig, ConfigError, TickgenConfig};
use crate::error::{Error, Result};
use crate::nodes::Publication;
use crate::topics;

use super::clock::{TickClock, format_tick};
use super::mqtt::{Session, request_capacity};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Builds the clock described by `config`.
///
/// Without a configured start the clock starts at the current UTC minute.
///
/// # Errors
///
/// Returns [`Error::Config`] if `start` is not a timestamp or the step is
/// out of range.
pub fn clock_from_config(config: &TickgenConfig) -> Result<TickClock> {
    let start = match &config.start {
        Some(start) => Tick::parse(start)
            .map_err(|e| config_error("tickgen.start", e.to_string()))?
            .time(),
        None => current_minute(),
    };
    let step = TimeDelta::try_minutes(config.step_minutes)
        .ok_or_else(|| config_error("tickgen.step_minutes", "out of range"))?;
    let clock = TickClock::new(start, step);
    Ok(match config.count {
        Some(count) => clock.with_limit(count),
        None => clock,
    })
}

/// Wall-clock pause between ticks, never shorter than a millisecond.
///
/// # Errors
///
/// Returns [`Error::Config`] if `interval_secs` is negative, not finite or
/// too large for a [`Duration`].
pub fn pace_from_config(config: &TickgenConfig) -> Result<Duration> {
    let period = Duration::try_from_secs_f64(config.interval_secs)
        .map_err(|e| config_error("tickgen.interval_secs", e.to_string()))?;
    Ok(period.max(MIN_PERIOD))
}

fn config_error(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn current_minute() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Publishes ticks on the tick topic until the clock runs out or Ctrl-C.
///
/// # Errors
///
/// Returns a transport error from the client.
pub async fn run_tickgen(broker: &BrokerConfig, config: &TickgenConfig) -> Result<()> {
    let mut clock = clock_from_config(config)?;
    let period = pace_from_config(config)?;
    let mut session = Session::new(&config.name, broker, request_capacity(1));
    let mut pace = interval(period);
    pace.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        step_minutes = config.step_minutes,
        interval_secs = config.interval_secs,
        count = ?config.count,
        "tick generator started"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.map_err(Error::Signal)?;
                info!("interrupt received, shutting down");
                return session.disconnect().await;
            }
            _ = pace.tick() => match clock.tick() {
                Some(t) => {
                    let stamp = format_tick(t);
                    debug!(timestamp = %stamp, "tick");
                    session.publish(Publication::new(topics::TICK, stamp));
                }
                None => {
                    info!("tick budget exhausted");
                    return session.disconnect().await;
                }
            },
            event = session.poll() => match event {
                Some(Event::Incoming(Packet::ConnAck(_))) => info!("connected"),
                Some(event) => trace!(?event, "transport event"),
                None => {}
            },
        }
    }
}
