//! Strict decoding of wire payloads into typed events.
//!
//! Every inbound payload goes through [`Decode`] before it reaches a node, so
//! handlers only ever see well-formed values. A failed decode is an input
//! error and is never skipped.

use std::convert::Infallible;
use std::str;

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Naive ISO-8601 layouts accepted for tick timestamps, tried in order.
const NAIVE_TICK_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Failure to turn a raw payload into a typed value.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] str::Utf8Error),

    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized timestamp \"{0}\"")]
    Timestamp(String),

    #[error("expected a decimal number, got \"{0}\"")]
    Number(String),

    #[error("node has no control channel")]
    NoControlChannel,
}

/// Strict decode step from raw transport bytes.
pub trait Decode: Sized {
    /// Parses `payload`, rejecting anything that is not exactly the expected shape.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] describing the first problem found.
    fn decode(payload: &[u8]) -> Result<Self, DecodeError>;
}

/// A clock event broadcast on the tick topic.
///
/// Keeps the timestamp exactly as received so that republished values carry
/// the same string the tick source emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    raw: String,
    time: NaiveDateTime,
}

impl Tick {
    /// Parses an ISO-8601 timestamp.
    ///
    /// RFC 3339 strings with an offset keep the wall-clock fields of that
    /// offset; naive strings are taken as-is.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Timestamp`] if no accepted layout matches.
    pub fn parse(raw: &str) -> Result<Self, DecodeError> {
        let time = DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_local())
            .ok()
            .or_else(|| {
                NAIVE_TICK_FORMATS
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            })
            .ok_or_else(|| DecodeError::Timestamp(raw.to_owned()))?;

        Ok(Self {
            raw: raw.to_owned(),
            time,
        })
    }

    /// The timestamp string as received.
    pub fn timestamp(&self) -> &str {
        &self.raw
    }

    /// The decoded wall-clock time.
    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    /// Hour of day, `0..24`.
    pub fn hour(&self) -> u32 {
        self.time.hour()
    }
}

impl Decode for Tick {
    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        Self::parse(str::from_utf8(payload)?)
    }
}

/// The `{payload, timestamp}` envelope used by sensors, sinks and consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub payload: f64,
    pub timestamp: String,
}

impl Reading {
    pub fn new(payload: f64, timestamp: impl Into<String>) -> Self {
        Self {
            payload,
            timestamp: timestamp.into(),
        }
    }

    /// Serializes the envelope as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if the envelope cannot be written.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Decode for Reading {
    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// New scale factor for a demand node, sent as a bare decimal string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleUpdate(pub f64);

impl Decode for ScaleUpdate {
    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let text = str::from_utf8(payload)?;
        text.trim()
            .parse()
            .map(Self)
            .map_err(|_| DecodeError::Number(text.to_owned()))
    }
}

/// Managed-mode switch for a dispatch node.
///
/// Only a case-insensitive `"true"` enables managed mode; every other string
/// disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeUpdate {
    pub managed: bool,
}

impl Decode for ModeUpdate {
    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let text = str::from_utf8(payload)?;
        Ok(Self {
            managed: text.eq_ignore_ascii_case("true"),
        })
    }
}

/// Control type of nodes without a control channel.
impl Decode for Infallible {
    fn decode(_payload: &[u8]) -> Result<Self, DecodeError> {
        Err(DecodeError::NoControlChannel)
    }
}
