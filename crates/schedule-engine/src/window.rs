//! Window membership -- does a meeting have an occurrence in `[start, start + duration)`?
//!
//! Only the first occurrence at-or-after the window start is examined. A
//! caller enumerating several occurrences in a long window re-queries with
//! an advanced start.

use chrono::{DateTime, Duration, Utc};

use crate::model::{Meeting, MeetingId};
use crate::occurrence::next_occurrence_start;
use crate::recurrence::RecurrenceDef;

/// True when the occurrence running at, or next after, `window_start` begins
/// before the window closes.
///
/// An occurrence that ends exactly at `window_start` does not count.
pub fn recurrence_occurs_in(
    def: &RecurrenceDef,
    window_start: DateTime<Utc>,
    window_duration: Duration,
) -> bool {
    let Some(start) = next_occurrence_start(def, window_start) else {
        return false;
    };
    match window_start.checked_add_signed(window_duration) {
        Some(window_end) => start < window_end,
        // The window reaches past the calendar; everything after its start is inside.
        None => window_duration > Duration::zero(),
    }
}

/// [`recurrence_occurs_in`] applied to a meeting's recurrence.
pub fn occurs_in(meeting: &Meeting, window_start: DateTime<Utc>, window_duration: Duration) -> bool {
    recurrence_occurs_in(&meeting.recurrence, window_start, window_duration)
}

/// Ids of the meetings that occur in the window, ascending and deduplicated.
pub fn meetings_in_window<'a, I>(
    meetings: I,
    window_start: DateTime<Utc>,
    window_duration: Duration,
) -> Vec<MeetingId>
where
    I: IntoIterator<Item = &'a Meeting>,
{
    let mut ids: Vec<MeetingId> = meetings
        .into_iter()
        .filter(|m| occurs_in(m, window_start, window_duration))
        .map(|m| m.id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
