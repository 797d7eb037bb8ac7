//! Users, meetings and their identifiers.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::EngineError;
use crate::period::Presence;
use crate::recurrence::RecurrenceDef;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse()
                    .map($name)
                    .map_err(|_| EngineError::parse($kind, s))
            }
        }
    };
}

id_type!(
    /// Identifier of a registered user. Assigned from 1 upwards.
    UserId,
    "user id"
);
id_type!(
    /// Identifier of a scheduled meeting. Assigned from 1 upwards.
    MeetingId,
    "meeting id"
);

/// A meeting member and their response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Participant {
    #[serde(rename = "UserId")]
    pub user_id: UserId,
    #[serde(rename = "Status")]
    pub status: Presence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Meeting {
    #[serde(rename = "MeetingId")]
    pub id: MeetingId,
    #[serde(rename = "CreatorId")]
    pub creator_id: UserId,
    #[serde(rename = "Members")]
    pub members: Vec<Participant>,
    #[serde(flatten)]
    pub recurrence: RecurrenceDef,
}

impl Meeting {
    /// A meeting whose members have not answered yet. Repeated member ids
    /// are kept once, in first-seen order.
    pub fn new(
        id: MeetingId,
        creator_id: UserId,
        member_ids: impl IntoIterator<Item = UserId>,
        recurrence: RecurrenceDef,
    ) -> Self {
        let mut members: Vec<Participant> = Vec::new();
        for user_id in member_ids {
            if !members.iter().any(|p| p.user_id == user_id) {
                members.push(Participant {
                    user_id,
                    status: Presence::Unknown,
                });
            }
        }
        Self {
            id,
            creator_id,
            members,
            recurrence,
        }
    }

    pub fn has_member(&self, user: UserId) -> bool {
        self.members.iter().any(|p| p.user_id == user)
    }

    pub fn member_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.members.iter().map(|p| p.user_id)
    }

    /// Record `user`'s response. Returns false if they are not a member.
    pub fn set_presence(&mut self, user: UserId, status: Presence) -> bool {
        match self.members.iter_mut().find(|p| p.user_id == user) {
            Some(member) => {
                member.status = status;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[serde(rename = "UserId")]
    pub id: UserId,
    #[serde(rename = "Name")]
    pub name: String,
    /// Back-references to the meetings this user is a member of.
    #[serde(skip)]
    pub meetings: BTreeSet<MeetingId>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            meetings: BTreeSet::new(),
        }
    }
}
