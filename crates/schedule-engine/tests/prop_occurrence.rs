//! Property-based tests for the occurrence calculator and free-time search.
//!
//! These tests verify invariants that should hold for *any* recurrence and
//! reference instant, not just the examples in `occurrence_tests.rs`.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use proptest::prelude::*;
use schedule_engine::{
    find_free_slot, next_occurrence, next_occurrence_start, Meeting, MeetingId, Period,
    RecurrenceDef, SearchLimits, UserId,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_period() -> impl Strategy<Value = Period> {
    prop_oneof![
        Just(Period::Once),
        Just(Period::Daily),
        Just(Period::Weekly),
        Just(Period::Monthly),
        Just(Period::Yearly),
    ]
}

/// An instant between 1999 and 2031, any day of month including 29-31.
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (1999i32..=2030, 1u32..=12, 1u32..=31, 0u32..=23, 0u32..=59).prop_map(|(y, m, d, h, min)| {
        // Clamp invalid days into the month so every input is a real date.
        let mut day = d;
        loop {
            if let Some(dt) = Utc.with_ymd_and_hms(y, m, day, h, min, 0).single() {
                return dt;
            }
            day -= 1;
        }
    })
}

/// Zero to three days, in minutes.
fn arb_duration() -> impl Strategy<Value = Duration> {
    (0i64..=3 * 24 * 60).prop_map(Duration::minutes)
}

fn arb_def() -> impl Strategy<Value = RecurrenceDef> {
    (arb_instant(), arb_duration(), arb_period())
        .prop_map(|(start, dur, period)| RecurrenceDef::new(start, dur, period).unwrap())
}

fn step_of(period: Period) -> Option<Duration> {
    match period {
        Period::Daily => Some(Duration::days(1)),
        Period::Weekly => Some(Duration::weeks(1)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn result_is_running_or_upcoming(def in arb_def(), after in arb_instant()) {
        if let Some(start) = next_occurrence_start(&def, after) {
            prop_assert!(start >= def.first_start());
            prop_assert!(start + def.duration() > after);
        }
    }

    #[test]
    fn once_matches_first_end(start in arb_instant(), dur in arb_duration(), after in arb_instant()) {
        let def = RecurrenceDef::new(start, dur, Period::Once).unwrap();
        let expected = (after < start + dur).then_some(start);
        prop_assert_eq!(next_occurrence_start(&def, after), expected);
    }

    #[test]
    fn recurring_series_never_end(def in arb_def(), after in arb_instant()) {
        if def.period() != Period::Once {
            prop_assert!(next_occurrence_start(&def, after).is_some());
        }
    }

    #[test]
    fn fixed_step_result_is_congruent_and_smallest(def in arb_def(), after in arb_instant()) {
        let Some(step) = step_of(def.period()) else { return Ok(()); };
        let start = next_occurrence_start(&def, after).unwrap();
        let offset = start - def.first_start();
        prop_assert_eq!(offset.num_seconds() % step.num_seconds(), 0);
        if start > def.first_start() {
            // The previous occurrence must already be over.
            prop_assert!(start - step + def.duration() <= after);
        }
    }

    #[test]
    fn calendar_step_keeps_day_and_time(def in arb_def(), after in arb_instant()) {
        if !matches!(def.period(), Period::Monthly | Period::Yearly) {
            return Ok(());
        }
        let start = next_occurrence_start(&def, after).unwrap();
        let first = def.first_start();
        prop_assert_eq!(start.day(), first.day());
        prop_assert_eq!(start.hour(), first.hour());
        prop_assert_eq!(start.minute(), first.minute());
        if def.period() == Period::Yearly {
            prop_assert_eq!(start.month(), first.month());
        }
    }

    #[test]
    fn free_slot_is_not_before_after_and_is_free(
        defs in proptest::collection::vec(arb_def(), 1..6),
        after in arb_instant(),
        slot_minutes in 0i64..=240,
    ) {
        let meetings: Vec<Meeting> = defs
            .into_iter()
            .enumerate()
            .map(|(i, def)| Meeting::new(MeetingId(i as u32 + 1), UserId(1), [UserId(1)], def))
            .collect();
        let slot = Duration::minutes(slot_minutes);
        let limits = SearchLimits::default();

        if let Ok(found) = find_free_slot(&meetings, after, slot, &limits) {
            prop_assert!(found >= after);
            for m in &meetings {
                if let Some(occ) = next_occurrence(&m.recurrence, found) {
                    prop_assert!(!occ.overlaps(found, found + slot));
                }
            }
            // Stable when restarted from its own answer.
            prop_assert_eq!(find_free_slot(&meetings, found, slot, &limits), Ok(found));
        }
    }
}
