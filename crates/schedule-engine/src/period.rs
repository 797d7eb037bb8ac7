//! Recurrence periods and presence responses, with their wire names.
//!
//! Both enums round-trip through a fixed name table: parsing an unknown
//! name is an error, never a fallback to a default variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::openapi::schema::{ObjectBuilder, Schema, Type};
use utoipa::openapi::RefOr;
use utoipa::{PartialSchema, ToSchema};

use crate::error::{EngineError, Result};

/// How often a meeting repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Period {
    /// A single occurrence.
    #[default]
    Once,
    /// Every 24 hours of elapsed UTC time.
    Daily,
    /// Every 7 days of elapsed UTC time.
    Weekly,
    /// Same day-of-month every month; months lacking that day are skipped.
    Monthly,
    /// Same month and day every year; Feb 29 only recurs in leap years.
    Yearly,
}

const PERIOD_NAMES: [(Period, &str); 5] = [
    (Period::Once, "Once"),
    (Period::Daily, "EveryDay"),
    (Period::Weekly, "EveryWeek"),
    (Period::Monthly, "EveryMonth"),
    (Period::Yearly, "EveryYear"),
];

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Once,
        Period::Daily,
        Period::Weekly,
        Period::Monthly,
        Period::Yearly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Once => "Once",
            Period::Daily => "EveryDay",
            Period::Weekly => "EveryWeek",
            Period::Monthly => "EveryMonth",
            Period::Yearly => "EveryYear",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        PERIOD_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(p, _)| *p)
            .ok_or_else(|| EngineError::parse("period", s))
    }
}

impl TryFrom<String> for Period {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Period> for &'static str {
    fn from(p: Period) -> Self {
        p.as_str()
    }
}

/// A member's answer to a meeting invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Presence {
    #[default]
    Unknown,
    Accepted,
    Rejected,
}

const PRESENCE_NAMES: [(Presence, &str); 3] = [
    (Presence::Unknown, "Unknown"),
    (Presence::Accepted, "Accepted"),
    (Presence::Rejected, "Rejected"),
];

impl Presence {
    pub const ALL: [Presence; 3] = [Presence::Unknown, Presence::Accepted, Presence::Rejected];

    pub fn as_str(self) -> &'static str {
        match self {
            Presence::Unknown => "Unknown",
            Presence::Accepted => "Accepted",
            Presence::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Presence {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        PRESENCE_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(p, _)| *p)
            .ok_or_else(|| EngineError::parse("presence", s))
    }
}

impl TryFrom<String> for Presence {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Presence> for &'static str {
    fn from(p: Presence) -> Self {
        p.as_str()
    }
}

// Both enums travel as plain strings, so their schema is the name table.
fn name_schema<const N: usize>(names: [&'static str; N]) -> RefOr<Schema> {
    RefOr::T(Schema::Object(
        ObjectBuilder::new()
            .schema_type(Type::String)
            .enum_values(Some(names))
            .build(),
    ))
}

impl PartialSchema for Period {
    fn schema() -> RefOr<Schema> {
        name_schema(PERIOD_NAMES.map(|(_, name)| name))
    }
}

impl ToSchema for Period {
    fn name() -> std::borrow::Cow<'static, str> {
        "Period".into()
    }
}

impl PartialSchema for Presence {
    fn schema() -> RefOr<Schema> {
        name_schema(PRESENCE_NAMES.map(|(_, name)| name))
    }
}

impl ToSchema for Presence {
    fn name() -> std::borrow::Cow<'static, str> {
        "Presence".into()
    }
}
