//! Static tables loaded once at node startup.

/// Quarter-hourly standard load profile.
pub mod profile;
/// Hourly producer dispatch schedule.
pub mod schedule;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use profile::LoadProfile;
pub use schedule::Schedule;

/// A table that cannot be loaded. Always fatal: the node does not start.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot read \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("column 0 holds slot labels, coefficient columns start at 1")]
    LabelColumn,

    #[error("line {line}: no column {column}")]
    MissingColumn { line: u64, column: usize },

    #[error("line {line}: invalid slot label \"{label}\" (expected HH:MM:SS)")]
    SlotLabel { line: u64, label: String },

    #[error("line {line}: invalid coefficient \"{value}\"")]
    Coefficient { line: u64, value: String },

    #[error("load profile has no slots")]
    EmptyProfile,

    #[error("schedule has no row for hour {0}")]
    MissingHour(usize),

    #[error("schedule row \"{0}\" is not an hour of the day")]
    UnexpectedHour(String),

    #[error("{what}: expected {expected} entries, found {actual}")]
    Shape {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("hour {hour}, producer {index}: invalid percentage \"{value}\"")]
    Percentage {
        hour: usize,
        index: usize,
        value: String,
    },
}
