//! Input errors raised while handling ticks and control updates.

use thiserror::Error;

use crate::codec::DecodeError;

/// A tick or control payload the node cannot process.
///
/// Never recovered from: the node stops rather than compute over bad input.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("malformed payload on \"{topic}\": {source}")]
    Decode {
        topic: String,
        #[source]
        source: DecodeError,
    },

    #[error("load profile has no slot {label}")]
    MissingSlot { label: String },

    #[error("schedule has no row for hour {hour}")]
    HourOutOfRange { hour: u32 },

    #[error("scale factor must be finite and non-negative, got {0}")]
    InvalidScale(f64),

    #[error("cannot encode output: {0}")]
    Encode(#[from] serde_json::Error),
}
