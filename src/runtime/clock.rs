use chrono::{NaiveDateTime, TimeDelta};

/// Layout of published tick timestamps.
pub const TICK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A simulation clock that advances a timestamp by a fixed step per tick.
///
/// The `TickClock` optionally stops after a number of ticks; without a limit
/// it runs until the timestamp overflows.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeDelta};
/// use grid_nodes::runtime::clock::{TickClock, format_tick};
///
/// let start = NaiveDate::from_ymd_opt(2024, 5, 1)
///     .and_then(|d| d.and_hms_opt(0, 0, 0))
///     .unwrap();
/// let mut clock = TickClock::new(start, TimeDelta::minutes(15)).with_limit(3);
/// let mut stamps = Vec::new();
///
/// clock.run(|t| stamps.push(format_tick(t)));
/// assert_eq!(
///     stamps,
///     vec!["2024-05-01T00:00:00", "2024-05-01T00:15:00", "2024-05-01T00:30:00"]
/// );
/// ```
pub struct TickClock {
    /// Timestamp the next tick will carry
    next: Option<NaiveDateTime>,
    /// Simulated time between ticks
    step: TimeDelta,
    /// Ticks left before stopping, unlimited when `None`
    remaining: Option<usize>,
}

impl TickClock {
    /// Creates an unlimited clock starting at `start`.
    ///
    /// # Arguments
    ///
    /// * `start` - Timestamp of the first tick
    /// * `step` - Simulated time added per tick
    pub fn new(start: NaiveDateTime, step: TimeDelta) -> Self {
        Self {
            next: Some(start),
            step,
            remaining: None,
        }
    }

    /// Stops the clock after `total` ticks.
    pub fn with_limit(mut self, total: usize) -> Self {
        self.remaining = Some(total);
        self
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some(timestamp)` - The timestamp for this tick
    /// * `None` - If the limit is reached or the timestamp overflowed
    pub fn tick(&mut self) -> Option<NaiveDateTime> {
        if self.remaining == Some(0) {
            return None;
        }
        let current = self.next?;
        self.next = current.checked_add_signed(self.step);
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(current)
    }

    /// Runs a function for each remaining tick.
    ///
    /// Only returns for limited clocks.
    pub fn run(&mut self, mut f: impl FnMut(NaiveDateTime)) {
        while let Some(t) = self.tick() {
            f(t);
        }
    }
}

/// Formats a tick timestamp as naive ISO-8601 with second resolution.
pub fn format_tick(t: NaiveDateTime) -> String {
    t.format(TICK_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::codec::Tick;

    fn midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    #[test]
    fn test_tick() {
        let mut clock = TickClock::new(midnight(), TimeDelta::minutes(15)).with_limit(2);
        assert_eq!(clock.tick(), Some(midnight()));
        assert_eq!(
            clock.tick(),
            Some(midnight() + TimeDelta::minutes(15))
        );
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn test_unlimited_clock_crosses_midnight() {
        let mut clock = TickClock::new(midnight(), TimeDelta::hours(1));
        let mut last = None;
        for _ in 0..25 {
            last = clock.tick();
        }
        assert_eq!(last.map(format_tick).as_deref(), Some("2024-05-02T00:00:00"));
    }

    #[test]
    fn test_empty_clock() {
        let mut clock = TickClock::new(midnight(), TimeDelta::minutes(15)).with_limit(0);
        assert_eq!(clock.tick(), None);

        let mut was_called = false;
        clock.run(|_| was_called = true);
        assert!(!was_called);
    }

    #[test]
    fn test_stops_on_overflow() {
        let mut clock = TickClock::new(NaiveDateTime::MAX, TimeDelta::minutes(15));
        assert_eq!(clock.tick(), Some(NaiveDateTime::MAX));
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn test_formatted_ticks_decode() {
        let mut clock = TickClock::new(midnight(), TimeDelta::minutes(15)).with_limit(96);
        clock.run(|t| {
            let tick = Tick::parse(&format_tick(t)).expect("published format decodes");
            assert_eq!(tick.time(), t);
        });
    }
}
