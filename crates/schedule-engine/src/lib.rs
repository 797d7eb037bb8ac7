//! # schedule-engine
//!
//! Recurrence and availability engine for a small meeting calendar.
//!
//! Given a meeting's first occurrence, its duration and a repeat period, the
//! engine finds the occurrence running at or starting after any instant,
//! decides whether a meeting falls in a query window, and searches for the
//! earliest slot that is free for a whole group of users. Everything here is
//! pure: inputs are borrowed snapshots and no call blocks or locks.
//!
//! ## Modules
//!
//! - [`occurrence`] — next occurrence of a series relative to an instant
//! - [`window`] — does a meeting occur in `[start, start + duration)`
//! - [`freetime`] — earliest common free slot across users
//! - [`recurrence`] — validated recurrence definitions
//! - [`period`] — repeat periods and presence responses
//! - [`model`] — users, meetings and ids
//! - [`duration`] — `1h30m` span notation
//! - [`error`] — Error types

pub mod duration;
pub mod error;
pub mod freetime;
pub mod model;
pub mod occurrence;
pub mod period;
pub mod recurrence;
pub mod window;

pub use error::EngineError;
pub use freetime::{find_free_slot, find_free_slot_for_users, MeetingSource, SearchLimits};
pub use model::{Meeting, MeetingId, Participant, User, UserId};
pub use occurrence::{next_occurrence, next_occurrence_start, Occurrence};
pub use period::{Period, Presence};
pub use recurrence::RecurrenceDef;
pub use window::{meetings_in_window, occurs_in};
