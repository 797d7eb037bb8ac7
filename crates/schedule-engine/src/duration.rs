//! Text form of time spans: `1h30m`, `96h`, `2h45m10s`, `1.5h`, `250ms`.
//!
//! A span is a sequence of `<number><unit>` pairs with an optional leading
//! sign. Units are `h`, `m`, `s`, `ms`, `us` (or `µs`) and `ns`.

use chrono::Duration;

use crate::error::{EngineError, Result};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

// Longest suffixes first so `ms` is not read as `m` followed by garbage.
const UNITS: [(&str, i128); 8] = [
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("h", 3_600 * NANOS_PER_SECOND),
    ("m", 60 * NANOS_PER_SECOND),
    ("s", NANOS_PER_SECOND),
];

/// Parse a span such as `1h30m` into a [`Duration`].
///
/// # Errors
/// Returns `EngineError::Parse` for empty input, a missing or unknown unit,
/// or a value that does not fit in a `Duration`.
pub fn parse_span(input: &str) -> Result<Duration> {
    let err = || EngineError::parse("duration", input);

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(err());
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after_int) = rest.split_at(int_len);
        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(tail) => {
                let frac_len = tail.bytes().take_while(u8::is_ascii_digit).count();
                tail.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }

        let (suffix, scale) = UNITS
            .iter()
            .find(|(suffix, _)| after_number.starts_with(suffix))
            .ok_or_else(err)?;
        rest = &after_number[suffix.len()..];

        let whole: i128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| err())?
        };
        let mut value = whole.checked_mul(*scale).ok_or_else(err)?;
        if !frac_part.is_empty() {
            // Digits beyond nanosecond resolution carry no information.
            let digits = &frac_part[..frac_part.len().min(18)];
            let numerator: i128 = digits.parse().map_err(|_| err())?;
            let denominator = 10i128.pow(digits.len() as u32);
            value += numerator * scale / denominator;
        }
        total = total.checked_add(value).ok_or_else(err)?;
    }

    if negative {
        total = -total;
    }
    let nanos = i64::try_from(total).map_err(|_| err())?;
    Ok(Duration::nanoseconds(nanos))
}

/// Format a span in the notation accepted by [`parse_span`].
///
/// Zero components are omitted (`90m` becomes `1h30m`); the zero span is `0s`.
pub fn format_span(span: Duration) -> String {
    if span.is_zero() {
        return "0s".to_string();
    }

    let mut out = String::new();
    if span < Duration::zero() {
        out.push('-');
    }
    let magnitude = span.abs();
    let total_secs = magnitude.num_seconds();
    let nanos = magnitude.subsec_nanos();

    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if nanos > 0 {
        let frac = format!("{nanos:09}");
        out.push_str(&format!("{seconds}.{}s", frac.trim_end_matches('0')));
    } else if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    out
}

/// `#[serde(with = "...")]` adapter storing a `Duration` in span notation.
pub mod serde_span {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(span: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_span(*span))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_span(&text).map_err(serde::de::Error::custom)
    }
}
