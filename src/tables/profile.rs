use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveTime;

use super::TableError;

/// Layout of slot labels in the profile file and in log output.
pub const SLOT_FORMAT: &str = "%H:%M:%S";

/// A standard load profile: quarter-hour slot → consumption coefficient.
///
/// The coefficients are normalized to a reference annual consumption; the
/// demand node scales them to a household size.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use grid_nodes::tables::LoadProfile;
///
/// let csv = "time,H0\n08:00:00,0.05\n08:15:00,0.06\n";
/// let profile = LoadProfile::from_csv_reader(csv.as_bytes(), 1).unwrap();
///
/// let slot = NaiveTime::from_hms_opt(8, 15, 0).unwrap();
/// assert_eq!(profile.coefficient(slot), Some(0.06));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadProfile {
    slots: BTreeMap<NaiveTime, f64>,
}

impl LoadProfile {
    /// Reads the profile from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the file cannot be opened or any row is malformed.
    pub fn from_csv_path(path: &Path, column: usize) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file, column)
    }

    /// Reads the profile from CSV data.
    ///
    /// The first row is a header. Column 0 holds `HH:MM:SS` slot labels and
    /// `column` holds the coefficients for the wanted profile.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] on the first malformed row, or if no slots are found.
    pub fn from_csv_reader(reader: impl Read, column: usize) -> Result<Self, TableError> {
        if column == 0 {
            return Err(TableError::LabelColumn);
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut slots = BTreeMap::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map_or(0, csv::Position::line);

            let label = record.get(0).unwrap_or_default().trim();
            let slot = NaiveTime::parse_from_str(label, SLOT_FORMAT).map_err(|_| {
                TableError::SlotLabel {
                    line,
                    label: label.to_owned(),
                }
            })?;

            let value = record
                .get(column)
                .ok_or(TableError::MissingColumn { line, column })?
                .trim();
            let coefficient = value.parse().map_err(|_| TableError::Coefficient {
                line,
                value: value.to_owned(),
            })?;

            slots.insert(slot, coefficient);
        }

        if slots.is_empty() {
            return Err(TableError::EmptyProfile);
        }
        Ok(Self { slots })
    }

    /// Coefficient for an exact slot, if the profile defines it.
    pub fn coefficient(&self, slot: NaiveTime) -> Option<f64> {
        self.slots.get(&slot).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl FromIterator<(NaiveTime, f64)> for LoadProfile {
    fn from_iter<I: IntoIterator<Item = (NaiveTime, f64)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}
