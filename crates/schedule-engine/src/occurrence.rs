//! Occurrence calculator -- finds the occurrence of a recurring meeting that is
//! still running, or starts next, at an arbitrary reference instant.
//!
//! Daily and weekly series step in whole elapsed-time units, so they never
//! drift. Monthly and yearly series step in calendar units from the first
//! occurrence and skip months (years) that lack the first occurrence's day:
//! a series on the 31st has no occurrence in April, a series on Feb 29 only
//! recurs in leap years. Nothing is ever rolled to the end of a month.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::period::Period;
use crate::recurrence::RecurrenceDef;

/// One concrete interval `[start, end)` produced by a recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Occurrence {
    /// Half-open overlap: touching intervals do not overlap, and an empty
    /// interval only overlaps something that strictly contains its instant.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}

/// Start of the earliest occurrence whose end is strictly after `after`.
///
/// Returns `None` when the series has ended (a past one-off meeting) or when
/// the next occurrence would fall outside the representable calendar range.
/// The result is never earlier than the first occurrence.
pub fn next_occurrence_start(def: &RecurrenceDef, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if def.first_end() > after {
        return Some(def.first_start());
    }

    match def.period() {
        Period::Once => None,
        Period::Daily => fixed_step(def, after, Duration::days(1)),
        Period::Weekly => fixed_step(def, after, Duration::weeks(1)),
        Period::Monthly => calendar_step(def, after, CalendarUnit::Month),
        Period::Yearly => calendar_step(def, after, CalendarUnit::Year),
    }
}

/// Like [`next_occurrence_start`], but returns the whole interval.
pub fn next_occurrence(def: &RecurrenceDef, after: DateTime<Utc>) -> Option<Occurrence> {
    let start = next_occurrence_start(def, after)?;
    // An end past the calendar range still lies after any reference instant.
    let end = start
        .checked_add_signed(def.duration())
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    Some(Occurrence { start, end })
}

/// `k = floor((after - first_end) / step) + 1` steps past the first start.
///
/// Only called once the first occurrence has ended, so the elapsed time is
/// non-negative and truncation equals flooring.
fn fixed_step(def: &RecurrenceDef, after: DateTime<Utc>, step: Duration) -> Option<DateTime<Utc>> {
    let elapsed = after - def.first_end();
    let steps = elapsed.num_seconds() / step.num_seconds() + 1;
    let offset = step.checked_mul(i32::try_from(steps).ok()?)?;
    def.first_start().checked_add_signed(offset)
}

#[derive(Debug, Clone, Copy)]
enum CalendarUnit {
    Month,
    Year,
}

impl CalendarUnit {
    /// Shortest possible length of one unit, in days.
    fn min_days(self) -> i64 {
        match self {
            CalendarUnit::Month => 28,
            CalendarUnit::Year => 365,
        }
    }
}

enum Candidate {
    At(DateTime<Utc>),
    NoSuchDay,
    OutOfRange,
}

fn calendar_step(
    def: &RecurrenceDef,
    after: DateTime<Utc>,
    unit: CalendarUnit,
) -> Option<DateTime<Utc>> {
    let first = def.first_start();
    let years = i64::from(after.year()) - i64::from(first.year());
    let distance = match unit {
        CalendarUnit::Month => years * 12 + i64::from(after.month()) - i64::from(first.month()),
        CalendarUnit::Year => years,
    };

    // Start one unit early, plus however many units a single occurrence can
    // span, so an occurrence still running at `after` is not stepped over.
    let spanned = def.duration().num_days() / unit.min_days();
    let mut offset = (distance - 1 - spanned).max(0);

    loop {
        match shifted(first, offset, unit) {
            Candidate::At(start) => match start.checked_add_signed(def.duration()) {
                Some(end) if end <= after => {}
                _ => return Some(start),
            },
            Candidate::NoSuchDay => {}
            Candidate::OutOfRange => return None,
        }
        offset += 1;
    }
}

/// The first occurrence moved `offset` months (years) forward, keeping its
/// day-of-month and time of day.
fn shifted(first: DateTime<Utc>, offset: i64, unit: CalendarUnit) -> Candidate {
    let (year, month) = match unit {
        CalendarUnit::Month => {
            let month0 = i64::from(first.month0()) + offset;
            (
                i64::from(first.year()) + month0.div_euclid(12),
                month0.rem_euclid(12) as u32 + 1,
            )
        }
        CalendarUnit::Year => (i64::from(first.year()) + offset, first.month()),
    };

    let year = match i32::try_from(year) {
        Ok(y) if y <= NaiveDate::MAX.year() => y,
        _ => return Candidate::OutOfRange,
    };
    match NaiveDate::from_ymd_opt(year, month, first.day()) {
        Some(date) => Candidate::At(date.and_time(first.time()).and_utc()),
        None => Candidate::NoSuchDay,
    }
}
