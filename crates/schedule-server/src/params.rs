//! Request argument checking for query strings and urlencoded forms.
//!
//! Every endpoint declares the arguments it accepts. Unknown names, missing
//! required names, empty values and repeats of single-valued names are all
//! rejected before any argument is interpreted.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use schedule_engine::duration::parse_span;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("unknown parameter {0:?}")]
    Unknown(String),

    #[error("required parameter {0:?} not found")]
    Missing(&'static str),

    #[error("parameter {0:?} has an empty value")]
    Empty(&'static str),

    #[error("parameter {0:?} given more than once")]
    Repeated(&'static str),

    #[error("parameter {name:?}: cannot parse {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Declaration of one accepted argument.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    name: &'static str,
    required: bool,
    repeatable: bool,
}

impl Param {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            repeatable: false,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            repeatable: false,
        }
    }

    /// Required, and may be given several times.
    pub const fn repeated(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            repeatable: true,
        }
    }
}

/// Checked arguments of one request.
#[derive(Debug, Default)]
pub struct Args {
    values: BTreeMap<&'static str, Vec<String>>,
}

impl Args {
    pub fn check(pairs: Vec<(String, String)>, accepted: &[Param]) -> Result<Self, ParamError> {
        let mut values: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            let param = accepted
                .iter()
                .find(|p| p.name == key)
                .ok_or(ParamError::Unknown(key))?;
            if value.is_empty() {
                return Err(ParamError::Empty(param.name));
            }
            values.entry(param.name).or_default().push(value);
        }

        for param in accepted {
            match values.get(param.name).map(Vec::len) {
                None if param.required => return Err(ParamError::Missing(param.name)),
                Some(n) if n > 1 && !param.repeatable => {
                    return Err(ParamError::Repeated(param.name))
                }
                _ => {}
            }
        }
        Ok(Self { values })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn raw(&self, name: &'static str) -> Result<&str, ParamError> {
        self.values
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
            .ok_or(ParamError::Missing(name))
    }

    /// Parse a single-valued argument.
    pub fn get<T: FromStr>(&self, name: &'static str) -> Result<T, ParamError> {
        let raw = self.raw(name)?;
        raw.parse().map_err(|_| invalid(name, raw))
    }

    /// Parse an optional single-valued argument.
    pub fn get_opt<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, ParamError> {
        if self.contains(name) {
            self.get(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Parse every comma separated item across all occurrences of `name`.
    pub fn get_list<T: FromStr>(&self, name: &'static str) -> Result<Vec<T>, ParamError> {
        let mut out = Vec::new();
        for value in self.values.get(name).into_iter().flatten() {
            for item in value.split(',') {
                out.push(item.trim().parse().map_err(|_| invalid(name, item))?);
            }
        }
        Ok(out)
    }

    /// An RFC 3339 instant, normalized to UTC.
    pub fn get_instant(&self, name: &'static str) -> Result<DateTime<Utc>, ParamError> {
        let raw = self.raw(name)?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| invalid(name, raw))
    }

    /// A non-negative span such as `1h30m`.
    pub fn get_span(&self, name: &'static str) -> Result<Duration, ParamError> {
        let raw = self.raw(name)?;
        match parse_span(raw) {
            Ok(span) if span >= Duration::zero() => Ok(span),
            _ => Err(invalid(name, raw)),
        }
    }

    /// A span that may be negative; range checks are left to the caller.
    pub fn get_signed_span(&self, name: &'static str) -> Result<Duration, ParamError> {
        let raw = self.raw(name)?;
        parse_span(raw).map_err(|_| invalid(name, raw))
    }
}

fn invalid(name: &'static str, value: &str) -> ParamError {
    ParamError::Invalid {
        name,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const MEETING: &[Param] = &[
        Param::required("creator_id"),
        Param::repeated("member_ids"),
        Param::optional("period"),
    ];

    #[test]
    fn accepts_declared_arguments() {
        let args = Args::check(
            pairs(&[
                ("creator_id", "1"),
                ("member_ids", "1,2"),
                ("member_ids", "3"),
            ]),
            MEETING,
        )
        .unwrap();
        assert_eq!(args.get::<u32>("creator_id").unwrap(), 1);
        assert_eq!(args.get_list::<u32>("member_ids").unwrap(), vec![1, 2, 3]);
        assert_eq!(args.get_opt::<String>("period").unwrap(), None);
    }

    #[test]
    fn rejects_unknown_missing_empty_and_repeated() {
        assert_eq!(
            Args::check(pairs(&[("user_id", "2")]), &[Param::optional("id")]).unwrap_err(),
            ParamError::Unknown("user_id".to_string())
        );
        assert_eq!(
            Args::check(pairs(&[("member_ids", "2")]), MEETING).unwrap_err(),
            ParamError::Missing("creator_id")
        );
        assert_eq!(
            Args::check(pairs(&[("creator_id", ""), ("member_ids", "2")]), MEETING).unwrap_err(),
            ParamError::Empty("creator_id")
        );
        assert_eq!(
            Args::check(
                pairs(&[("creator_id", "1"), ("creator_id", "2"), ("member_ids", "2")]),
                MEETING
            )
            .unwrap_err(),
            ParamError::Repeated("creator_id")
        );
    }

    #[test]
    fn parses_instants_and_spans() {
        let accepted = [Param::required("start_at"), Param::required("duration")];
        let args = Args::check(
            pairs(&[("start_at", "2022-11-20T10:00:00+02:00"), ("duration", "1h30m")]),
            &accepted,
        )
        .unwrap();
        assert_eq!(
            args.get_instant("start_at").unwrap(),
            "2022-11-20T08:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(args.get_span("duration").unwrap(), Duration::minutes(90));

        let negative =
            Args::check(pairs(&[("start_at", "x"), ("duration", "-1h")]), &accepted).unwrap();
        assert!(negative.get_instant("start_at").is_err());
        assert!(negative.get_span("duration").is_err());
        assert_eq!(
            negative.get_signed_span("duration").unwrap(),
            Duration::hours(-1)
        );
    }
}
