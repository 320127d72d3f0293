use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::MemberId;
use crate::store::{Record, Upsertable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Attending,
    Declined,
    Maybe,
}

impl RsvpStatus {
    /// Label shown on roster screens.
    pub fn label(&self) -> &'static str {
        match self {
            RsvpStatus::Attending => "出席",
            RsvpStatus::Declined => "欠席",
            RsvpStatus::Maybe => "未定",
        }
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsvpStatus::Attending => write!(f, "attending"),
            RsvpStatus::Declined => write!(f, "declined"),
            RsvpStatus::Maybe => write!(f, "maybe"),
        }
    }
}

impl FromStr for RsvpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attending" | "yes" | "y" | "going" => Ok(RsvpStatus::Attending),
            "declined" | "no" | "n" | "not going" | "not_going" => Ok(RsvpStatus::Declined),
            "maybe" | "undecided" => Ok(RsvpStatus::Maybe),
            other => Err(format!("unknown RSVP status: {}", other)),
        }
    }
}

/// One RSVP row. Guardian-level rows have no `child`; child-scoped rows
/// reference the child by id only, and the child may since have been removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventParticipation {
    pub event: EventId,
    pub member: MemberId,
    #[serde(default)]
    pub child: Option<MemberId>,
    pub status: RsvpStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

/// RSVP payload. A `None` comment leaves the stored comment untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipationPatch {
    pub status: RsvpStatus,
    pub comment: Option<String>,
}

impl ParticipationPatch {
    pub fn status(status: RsvpStatus) -> Self {
        Self {
            status,
            comment: None,
        }
    }
}

impl Record for EventParticipation {
    const COLLECTION: &'static str = "event_participations";
    type Key = (EventId, MemberId, Option<MemberId>);

    fn key(&self) -> Self::Key {
        (self.event, self.member, self.child)
    }
}

impl Upsertable for EventParticipation {
    type Patch = ParticipationPatch;

    fn from_key((event, member, child): Self::Key, patch: ParticipationPatch) -> Self {
        Self {
            event,
            member,
            child,
            status: patch.status,
            comment: patch.comment,
        }
    }

    fn apply(&mut self, patch: ParticipationPatch) {
        self.status = patch.status;
        if patch.comment.is_some() {
            self.comment = patch.comment;
        }
    }
}
