use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use super::TableError;

/// Rows in a day-long schedule, one per hour.
pub const HOURS_PER_DAY: usize = 24;

/// Schedule file layout as written by operators.
#[derive(Debug, Deserialize)]
struct RawSchedule {
    producer: Vec<String>,
    schedule: BTreeMap<String, Vec<Percentage>>,
    rated_power: Vec<f64>,
}

/// Percentages may be written either as numbers or as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Percentage {
    Number(f64),
    Text(String),
}

/// An hourly dispatch plan for a fixed set of producers.
///
/// Each producer has a topic, a rated power and, for every hour of the day, a
/// percentage of that rated power to run at.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    producers: Vec<String>,
    rated_power: Vec<f64>,
    /// `HOURS_PER_DAY` rows, each with one percentage per producer.
    rows: Vec<Vec<f64>>,
}

impl Schedule {
    /// Builds a schedule from aligned tables.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Shape`] unless `rated_power` has one entry per
    /// producer and `rows` has `HOURS_PER_DAY` rows of one entry per producer.
    pub fn new(
        producers: Vec<String>,
        rated_power: Vec<f64>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, TableError> {
        let n = producers.len();
        check_len("rated_power", n, rated_power.len())?;
        check_len("schedule", HOURS_PER_DAY, rows.len())?;
        for (hour, row) in rows.iter().enumerate() {
            check_len(&format!("schedule hour {hour}"), n, row.len())?;
        }

        Ok(Self {
            producers,
            rated_power,
            rows,
        })
    }

    /// Reads a schedule from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the file cannot be opened or the content is invalid.
    pub fn from_json_path(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_reader(BufReader::new(file))
    }

    /// Reads a schedule from JSON data.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the JSON is malformed, an hour is missing or
    /// unknown, a percentage is not numeric, or the tables are misaligned.
    pub fn from_json_reader(reader: impl Read) -> Result<Self, TableError> {
        let raw: RawSchedule = serde_json::from_reader(reader)?;

        if let Some(key) = raw
            .schedule
            .keys()
            .find(|key| key.parse::<usize>().map_or(true, |h| h >= HOURS_PER_DAY))
        {
            return Err(TableError::UnexpectedHour(key.clone()));
        }

        let mut rows = Vec::with_capacity(HOURS_PER_DAY);
        for hour in 0..HOURS_PER_DAY {
            let row = raw
                .schedule
                .get(&hour.to_string())
                .ok_or(TableError::MissingHour(hour))?;
            let row = row
                .iter()
                .enumerate()
                .map(|(index, pct)| match pct {
                    Percentage::Number(value) => Ok(*value),
                    Percentage::Text(text) => {
                        text.trim().parse().map_err(|_| TableError::Percentage {
                            hour,
                            index,
                            value: text.clone(),
                        })
                    }
                })
                .collect::<Result<Vec<f64>, _>>()?;
            rows.push(row);
        }

        Self::new(raw.producer, raw.rated_power, rows)
    }

    /// Producer topics in schedule order.
    pub fn producers(&self) -> &[String] {
        &self.producers
    }

    /// Rated power per producer, aligned with [`Schedule::producers`].
    pub fn rated_power(&self) -> &[f64] {
        &self.rated_power
    }

    /// Percentages for `hour`, or `None` outside `0..HOURS_PER_DAY`.
    pub fn row(&self, hour: u32) -> Option<&[f64]> {
        self.rows.get(hour as usize).map(Vec::as_slice)
    }

    /// Setpoints for every producer at `hour`, in producer order.
    ///
    /// Each setpoint is `rated_power * percentage / 100`.
    pub fn setpoints(&self, hour: u32) -> Option<Vec<(&str, f64)>> {
        let row = self.row(hour)?;
        Some(
            self.producers
                .iter()
                .zip(&self.rated_power)
                .zip(row)
                .map(|((producer, rated), pct)| (producer.as_str(), rated * pct / 100.0))
                .collect(),
        )
    }
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<(), TableError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TableError::Shape {
            what: what.to_owned(),
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::*;

    /// JSON schedule with hour 5 set to `hour5` and every other hour at 0%.
    fn schedule_json(producers: &[&str], rated: &[f64], hour5: Value) -> String {
        let zeros = json!(vec![0; producers.len()]);
        let rows: Map<String, Value> = (0..HOURS_PER_DAY)
            .map(|h| {
                let row = if h == 5 { hour5.clone() } else { zeros.clone() };
                (h.to_string(), row)
            })
            .collect();
        json!({
            "producer": producers,
            "rated_power": rated,
            "schedule": rows,
        })
        .to_string()
    }

    #[test]
    fn computes_setpoints_from_percentages() {
        let json = schedule_json(&["p/a", "p/b"], &[1000.0, 2000.0], json!([50, 100]));
        let schedule = Schedule::from_json_reader(json.as_bytes()).expect("valid schedule");
        assert_eq!(
            schedule.setpoints(5),
            Some(vec![("p/a", 500.0), ("p/b", 2000.0)])
        );
        assert_eq!(schedule.setpoints(6), Some(vec![("p/a", 0.0), ("p/b", 0.0)]));
        assert_eq!(schedule.setpoints(24), None);
    }

    #[test]
    fn accepts_numeric_strings() {
        let json = schedule_json(&["p/a"], &[400.0], json!(["25"]));
        let schedule = Schedule::from_json_reader(json.as_bytes()).expect("valid schedule");
        assert_eq!(schedule.row(5), Some(&[25.0][..]));
    }

    #[test]
    fn rejects_non_numeric_percentage() {
        let json = schedule_json(&["p/a"], &[400.0], json!(["most"]));
        assert!(matches!(
            Schedule::from_json_reader(json.as_bytes()),
            Err(TableError::Percentage { hour: 5, index: 0, .. })
        ));
    }

    #[test]
    fn rejects_misaligned_tables() {
        let json = schedule_json(&["p/a", "p/b"], &[1000.0], json!([50, 100]));
        assert!(matches!(
            Schedule::from_json_reader(json.as_bytes()),
            Err(TableError::Shape { expected: 2, actual: 1, .. })
        ));

        let json = schedule_json(&["p/a", "p/b"], &[1000.0, 2000.0], json!([50]));
        assert!(matches!(
            Schedule::from_json_reader(json.as_bytes()),
            Err(TableError::Shape { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn requires_every_hour() {
        let json = r#"{"producer": ["p"], "rated_power": [1.0], "schedule": {"0": [1]}}"#;
        assert!(matches!(
            Schedule::from_json_reader(json.as_bytes()),
            Err(TableError::MissingHour(1))
        ));

        let json = r#"{"producer": ["p"], "rated_power": [1.0], "schedule": {"24": [1]}}"#;
        assert!(matches!(
            Schedule::from_json_reader(json.as_bytes()),
            Err(TableError::UnexpectedHour(key)) if key == "24"
        ));
    }

    #[test]
    fn new_validates_row_count() {
        let result = Schedule::new(vec!["p".into()], vec![1.0], vec![vec![1.0]; 23]);
        assert!(matches!(
            result,
            Err(TableError::Shape { expected: 24, actual: 23, .. })
        ));
    }
}
