//! Free-time search across several users' meetings.
//!
//! Starting from the reference instant, the candidate slot is pushed past
//! whichever conflicting occurrence ends last, until a slot with no
//! conflicts is found or the lookahead bound is reached.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::error::{EngineError, Result};
use crate::model::{Meeting, MeetingId, UserId};
use crate::occurrence::{next_occurrence, Occurrence};
use crate::recurrence::RecurrenceDef;

/// Bounds on how far [`find_free_slot`] looks before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Candidates starting later than `after + horizon` are not considered.
    pub horizon: Duration,
    /// Maximum number of candidates examined.
    pub max_iterations: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            horizon: Duration::days(365),
            max_iterations: 100_000,
        }
    }
}

/// Read access to the meetings each user takes part in.
///
/// Implementations hand out owned snapshots; an unknown user simply has no
/// meetings.
pub trait MeetingSource {
    fn meetings_of(&self, user: UserId) -> Vec<Meeting>;
}

/// Earliest instant `>= after` at which a slot of `slot` length is free in
/// every one of `meetings`.
///
/// Meetings are deduplicated by id, so overlapping per-user meeting sets can
/// be passed as-is.
///
/// # Errors
/// - `EngineError::InvalidDefinition` if `slot` is negative.
/// - `EngineError::LookaheadExceeded` if no slot is found within `limits`.
pub fn find_free_slot<'a, I>(
    meetings: I,
    after: DateTime<Utc>,
    slot: Duration,
    limits: &SearchLimits,
) -> Result<DateTime<Utc>>
where
    I: IntoIterator<Item = &'a Meeting>,
{
    if slot < Duration::zero() {
        return Err(EngineError::InvalidDefinition(format!(
            "negative slot length {}",
            crate::duration::format_span(slot)
        )));
    }

    let recurrences: BTreeMap<MeetingId, &RecurrenceDef> = meetings
        .into_iter()
        .map(|m| (m.id, &m.recurrence))
        .collect();

    let exceeded = || EngineError::LookaheadExceeded {
        horizon: limits.horizon,
    };
    let deadline = after
        .checked_add_signed(limits.horizon)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let mut candidate = after;
    for _ in 0..limits.max_iterations {
        if candidate > deadline {
            break;
        }
        let slot_end = candidate.checked_add_signed(slot).ok_or_else(exceeded)?;

        match latest_blocker(recurrences.values().copied(), candidate, slot_end) {
            None => return Ok(candidate),
            // The blocker is still running at `candidate`, so its end is later.
            Some(blocker) => candidate = blocker.end,
        }
    }

    Err(exceeded())
}

/// [`find_free_slot`] over the union of the given users' meetings.
pub fn find_free_slot_for_users<S>(
    source: &S,
    users: &[UserId],
    after: DateTime<Utc>,
    slot: Duration,
    limits: &SearchLimits,
) -> Result<DateTime<Utc>>
where
    S: MeetingSource + ?Sized,
{
    let meetings: Vec<Meeting> = users
        .iter()
        .flat_map(|&user| source.meetings_of(user))
        .collect();
    find_free_slot(&meetings, after, slot, limits)
}

/// Among the occurrences overlapping `[slot_start, slot_end)`, the one that
/// ends last.
fn latest_blocker<'a>(
    recurrences: impl Iterator<Item = &'a RecurrenceDef>,
    slot_start: DateTime<Utc>,
    slot_end: DateTime<Utc>,
) -> Option<Occurrence> {
    recurrences
        .filter_map(|def| next_occurrence(def, slot_start))
        .filter(|occ| occ.overlaps(slot_start, slot_end))
        .max_by_key(|occ| occ.end)
}
