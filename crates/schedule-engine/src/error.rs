//! Error types for schedule-engine operations.

use chrono::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A recurrence definition that cannot describe any series
    /// (negative duration, out-of-range instant).
    #[error("Invalid recurrence definition: {0}")]
    InvalidDefinition(String),

    /// A textual value (period name, presence name, span) did not parse.
    #[error("Invalid {kind}: {value:?}")]
    Parse { kind: &'static str, value: String },

    /// Free-time search gave up before finding a slot.
    #[error("No free slot found within {} days", horizon.num_days())]
    LookaheadExceeded { horizon: Duration },
}

impl EngineError {
    pub(crate) fn parse(kind: &'static str, value: &str) -> Self {
        EngineError::Parse {
            kind,
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
