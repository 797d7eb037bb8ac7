//! In-memory user and meeting registries.
//!
//! Each registry sits behind its own mutex. When both are needed the users
//! lock is always taken first. Readers get cloned snapshots, so no lock is
//! held while the engine works on them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use schedule_engine::{
    Meeting, MeetingId, MeetingSource, Presence, RecurrenceDef, User, UserId,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("user {0} does not exist")]
    UserNotFound(UserId),

    #[error("meeting {0} does not exist")]
    MeetingNotFound(MeetingId),

    #[error("user {user} is not a member of meeting {meeting}")]
    NotAMember { user: UserId, meeting: MeetingId },

    #[error("recurrence of meeting {0} cannot be changed")]
    RecurrenceChanged(MeetingId),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Default)]
struct UserRegistry {
    by_id: BTreeMap<UserId, User>,
    last_id: u32,
}

impl UserRegistry {
    fn ensure_exists(&self, ids: impl IntoIterator<Item = UserId>) -> Result<()> {
        for id in ids {
            if !self.by_id.contains_key(&id) {
                return Err(StoreError::UserNotFound(id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MeetingRegistry {
    by_id: BTreeMap<MeetingId, Meeting>,
    last_id: u32,
}

/// Users and meetings of one service instance.
#[derive(Debug, Default)]
pub struct Store {
    users: Mutex<UserRegistry>,
    meetings: Mutex<MeetingRegistry>,
}

// Every mutation below completes before its guard drops, so a poisoned lock
// still guards consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_user(&self, name: &str) -> UserId {
        let mut users = lock(&self.users);
        users.last_id += 1;
        let id = UserId(users.last_id);
        users.by_id.insert(id, User::new(id, name));
        id
    }

    pub fn find_user(&self, id: UserId) -> Result<User> {
        lock(&self.users)
            .by_id
            .get(&id)
            .cloned()
            .ok_or(StoreError::UserNotFound(id))
    }

    /// All users, ordered by id.
    pub fn list_users(&self) -> Vec<User> {
        lock(&self.users).by_id.values().cloned().collect()
    }

    /// Schedule a meeting. The creator and every member must be registered.
    pub fn create_meeting(
        &self,
        creator: UserId,
        members: &[UserId],
        recurrence: RecurrenceDef,
    ) -> Result<MeetingId> {
        let mut users = lock(&self.users);
        users.ensure_exists(std::iter::once(creator).chain(members.iter().copied()))?;

        let mut meetings = lock(&self.meetings);
        meetings.last_id += 1;
        let id = MeetingId(meetings.last_id);
        let meeting = Meeting::new(id, creator, members.iter().copied(), recurrence);
        for member in meeting.member_ids() {
            if let Some(user) = users.by_id.get_mut(&member) {
                user.meetings.insert(id);
            }
        }
        meetings.by_id.insert(id, meeting);
        Ok(id)
    }

    pub fn find_meeting(&self, id: MeetingId) -> Result<Meeting> {
        lock(&self.meetings)
            .by_id
            .get(&id)
            .cloned()
            .ok_or(StoreError::MeetingNotFound(id))
    }

    /// All meetings, ordered by id.
    pub fn all_meetings(&self) -> Vec<Meeting> {
        lock(&self.meetings).by_id.values().cloned().collect()
    }

    /// Replace a meeting's member list and responses.
    ///
    /// Users dropped from the member list lose their back-reference to the
    /// meeting; users added gain one. The recurrence cannot change.
    pub fn update_meeting(&self, updated: Meeting) -> Result<()> {
        self.modify_meeting(updated.id, move |current| {
            *current = updated;
            Ok(())
        })
    }

    /// Record a member's response to a meeting.
    pub fn set_presence(&self, meeting: MeetingId, user: UserId, presence: Presence) -> Result<()> {
        self.modify_meeting(meeting, |current| {
            if current.set_presence(user, presence) {
                Ok(())
            } else {
                Err(StoreError::NotAMember { user, meeting })
            }
        })
    }

    /// Apply `edit` to a copy of the meeting and commit it if the result is
    /// valid, all under both locks.
    fn modify_meeting<F>(&self, id: MeetingId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Meeting) -> Result<()>,
    {
        let mut users = lock(&self.users);
        let mut meetings = lock(&self.meetings);
        let current = meetings
            .by_id
            .get_mut(&id)
            .ok_or(StoreError::MeetingNotFound(id))?;

        let mut updated = current.clone();
        edit(&mut updated)?;
        if updated.recurrence != current.recurrence {
            return Err(StoreError::RecurrenceChanged(id));
        }
        users.ensure_exists(updated.member_ids())?;

        let before: BTreeSet<UserId> = current.member_ids().collect();
        let after: BTreeSet<UserId> = updated.member_ids().collect();
        for removed in before.difference(&after) {
            if let Some(user) = users.by_id.get_mut(removed) {
                user.meetings.remove(&id);
            }
        }
        for added in after.difference(&before) {
            if let Some(user) = users.by_id.get_mut(added) {
                user.meetings.insert(id);
            }
        }

        *current = updated;
        Ok(())
    }

    /// Snapshot of the meetings `user` is a member of, ordered by id.
    pub fn user_meetings(&self, user: UserId) -> Result<Vec<Meeting>> {
        self.users_meetings(&[user])
    }

    /// Union of the given users' meetings, each meeting once, ordered by id.
    pub fn users_meetings(&self, ids: &[UserId]) -> Result<Vec<Meeting>> {
        let users = lock(&self.users);
        let mut wanted = BTreeSet::new();
        for id in ids {
            let user = users.by_id.get(id).ok_or(StoreError::UserNotFound(*id))?;
            wanted.extend(user.meetings.iter().copied());
        }

        let meetings = lock(&self.meetings);
        Ok(wanted
            .into_iter()
            .filter_map(|id| meetings.by_id.get(&id).cloned())
            .collect())
    }
}

impl MeetingSource for Store {
    fn meetings_of(&self, user: UserId) -> Vec<Meeting> {
        self.user_meetings(user).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use schedule_engine::Period;

    fn daily() -> RecurrenceDef {
        RecurrenceDef::new(
            Utc.with_ymd_and_hms(2022, 11, 20, 8, 0, 0).unwrap(),
            Duration::hours(1),
            Period::Daily,
        )
        .unwrap()
    }

    fn ids(meetings: &[Meeting]) -> Vec<MeetingId> {
        meetings.iter().map(|m| m.id).collect()
    }

    #[test]
    fn ids_start_at_one_and_increment() {
        let store = Store::new();
        assert_eq!(store.create_user("John Doe"), UserId(1));
        assert_eq!(store.create_user("Vincent Vega"), UserId(2));
        let m = store.create_meeting(UserId(1), &[UserId(1), UserId(2)], daily()).unwrap();
        assert_eq!(m, MeetingId(1));
    }

    #[test]
    fn fresh_stores_are_independent() {
        let a = Store::new();
        let b = Store::new();
        a.create_user("John Doe");
        assert_eq!(a.list_users().len(), 1);
        assert!(b.list_users().is_empty());
    }

    #[test]
    fn meeting_with_unknown_member_is_rejected() {
        let store = Store::new();
        let john = store.create_user("John Doe");
        let err = store
            .create_meeting(john, &[john, UserId(7)], daily())
            .unwrap_err();
        assert_eq!(err, StoreError::UserNotFound(UserId(7)));
        assert!(store.all_meetings().is_empty());
    }

    #[test]
    fn members_get_back_references() {
        let store = Store::new();
        let john = store.create_user("John Doe");
        let vincent = store.create_user("Vincent Vega");
        let rick = store.create_user("Rick Sanchez");
        let m1 = store.create_meeting(rick, &[john, vincent], daily()).unwrap();
        let m2 = store.create_meeting(rick, &[vincent], daily()).unwrap();

        assert_eq!(ids(&store.user_meetings(john).unwrap()), vec![m1]);
        assert_eq!(ids(&store.user_meetings(vincent).unwrap()), vec![m1, m2]);
        // The creator is not implicitly a member.
        assert!(store.user_meetings(rick).unwrap().is_empty());
        assert_eq!(
            ids(&store.users_meetings(&[john, vincent]).unwrap()),
            vec![m1, m2]
        );
    }

    #[test]
    fn update_reconciles_back_references() {
        let store = Store::new();
        let john = store.create_user("John Doe");
        let vincent = store.create_user("Vincent Vega");
        let id = store.create_meeting(john, &[john, vincent], daily()).unwrap();

        let mut meeting = store.find_meeting(id).unwrap();
        meeting.members.retain(|p| p.user_id != vincent);
        store.update_meeting(meeting).unwrap();

        assert!(store.user_meetings(vincent).unwrap().is_empty());
        assert!(!store.find_user(vincent).unwrap().meetings.contains(&id));
        assert_eq!(ids(&store.user_meetings(john).unwrap()), vec![id]);

        let mut meeting = store.find_meeting(id).unwrap();
        meeting.members.push(schedule_engine::Participant {
            user_id: vincent,
            status: Presence::Accepted,
        });
        store.update_meeting(meeting).unwrap();
        assert_eq!(ids(&store.user_meetings(vincent).unwrap()), vec![id]);
    }

    #[test]
    fn update_cannot_change_recurrence() {
        let store = Store::new();
        let john = store.create_user("John Doe");
        let id = store.create_meeting(john, &[john], daily()).unwrap();
        let mut meeting = store.find_meeting(id).unwrap();
        meeting.recurrence =
            RecurrenceDef::new(meeting.recurrence.first_start(), Duration::hours(2), Period::Daily)
                .unwrap();
        assert_eq!(
            store.update_meeting(meeting),
            Err(StoreError::RecurrenceChanged(id))
        );
    }

    #[test]
    fn presence_requires_membership() {
        let store = Store::new();
        let john = store.create_user("John Doe");
        let vincent = store.create_user("Vincent Vega");
        let id = store.create_meeting(john, &[john], daily()).unwrap();

        store.set_presence(id, john, Presence::Accepted).unwrap();
        assert_eq!(
            store.set_presence(id, vincent, Presence::Rejected),
            Err(StoreError::NotAMember {
                user: vincent,
                meeting: id
            })
        );
        assert_eq!(
            store.set_presence(MeetingId(40), john, Presence::Rejected),
            Err(StoreError::MeetingNotFound(MeetingId(40)))
        );
        assert_eq!(
            store.find_meeting(id).unwrap().members[0].status,
            Presence::Accepted
        );
    }

    #[test]
    fn presence_keeps_back_references() {
        let store = Store::new();
        let john = store.create_user("John Doe");
        let vincent = store.create_user("Vincent Vega");
        let id = store.create_meeting(john, &[john, vincent], daily()).unwrap();

        store.set_presence(id, vincent, Presence::Rejected).unwrap();

        assert_eq!(ids(&store.user_meetings(john).unwrap()), vec![id]);
        assert_eq!(ids(&store.user_meetings(vincent).unwrap()), vec![id]);
        let meeting = store.find_meeting(id).unwrap();
        assert_eq!(meeting.recurrence, daily());
        assert_eq!(meeting.members[1].status, Presence::Rejected);
    }

    #[test]
    fn rejected_update_changes_nothing() {
        let store = Store::new();
        let john = store.create_user("John Doe");
        let id = store.create_meeting(john, &[john], daily()).unwrap();

        let mut meeting = store.find_meeting(id).unwrap();
        meeting.members.push(schedule_engine::Participant {
            user_id: UserId(9),
            status: Presence::Unknown,
        });
        meeting.members[0].status = Presence::Accepted;
        assert_eq!(
            store.update_meeting(meeting),
            Err(StoreError::UserNotFound(UserId(9)))
        );
        assert_eq!(
            store.find_meeting(id).unwrap().members[0].status,
            Presence::Unknown
        );

        let stranger = Meeting::new(MeetingId(5), john, [john], daily());
        assert_eq!(
            store.update_meeting(stranger),
            Err(StoreError::MeetingNotFound(MeetingId(5)))
        );
    }

    #[test]
    fn unknown_user_source_is_empty() {
        let store = Store::new();
        assert!(store.meetings_of(UserId(3)).is_empty());
        assert_eq!(
            store.user_meetings(UserId(3)),
            Err(StoreError::UserNotFound(UserId(3)))
        );
    }
}
