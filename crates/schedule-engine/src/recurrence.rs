//! The recurrence shape of a meeting: first start, per-occurrence duration, period.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::duration::serde_span;
use crate::error::{EngineError, Result};
use crate::period::Period;

/// A validated recurrence definition.
///
/// Occurrence #0 starts at `first_start`; every occurrence lasts `duration`.
/// The duration is never negative, which is checked on construction and on
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "RawRecurrence")]
pub struct RecurrenceDef {
    #[serde(rename = "FirstOccurence")]
    first_start: DateTime<Utc>,
    #[serde(rename = "Duration", with = "serde_span")]
    #[schema(value_type = String, example = "1h30m")]
    duration: Duration,
    #[serde(rename = "Repeat")]
    period: Period,
}

#[derive(Deserialize)]
struct RawRecurrence {
    #[serde(rename = "FirstOccurence")]
    first_start: DateTime<Utc>,
    #[serde(rename = "Duration", with = "serde_span")]
    duration: Duration,
    #[serde(rename = "Repeat", default)]
    period: Period,
}

impl TryFrom<RawRecurrence> for RecurrenceDef {
    type Error = EngineError;

    fn try_from(raw: RawRecurrence) -> Result<Self> {
        RecurrenceDef::new(raw.first_start, raw.duration, raw.period)
    }
}

impl RecurrenceDef {
    /// # Errors
    /// Returns `EngineError::InvalidDefinition` when `duration` is negative or
    /// the first occurrence's end is not representable.
    pub fn new(first_start: DateTime<Utc>, duration: Duration, period: Period) -> Result<Self> {
        if duration < Duration::zero() {
            return Err(EngineError::InvalidDefinition(format!(
                "negative duration {}",
                crate::duration::format_span(duration)
            )));
        }
        if first_start.checked_add_signed(duration).is_none() {
            return Err(EngineError::InvalidDefinition(format!(
                "occurrence starting {first_start} ends out of range"
            )));
        }
        Ok(Self {
            first_start,
            duration,
            period,
        })
    }

    /// Shorthand for a non-repeating definition.
    pub fn once(start: DateTime<Utc>, duration: Duration) -> Result<Self> {
        Self::new(start, duration, Period::Once)
    }

    pub fn first_start(&self) -> DateTime<Utc> {
        self.first_start
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// End of the first occurrence. Always representable (checked in `new`).
    pub fn first_end(&self) -> DateTime<Utc> {
        self.first_start + self.duration
    }
}
