//! Typed entities of the association.
//!
//! - `Member`: guardians and children, with birthdates for children
//! - `OfficerRole`, `RoleAssignment`, `RoleTask`: yearly officer roster
//! - `EventParticipation`: RSVP rows per event and member (and child)
//! - `Notification`, `NotificationRecipient`: sent notices and their fan-out
//! - `CurrentDocument`: constitution / bylaws, single current version
//!
//! Each entity implements `store::Record` with its natural key.

pub mod document;
pub mod event;
pub mod member;
pub mod notification;
pub mod role;

pub use document::{CurrentDocument, DocumentRevision};
pub use event::{EventId, EventParticipation, ParticipationPatch, RsvpStatus};
pub use member::{Member, MemberId, MemberKind, MemberPatch};
pub use notification::{Notification, NotificationRecipient};
pub use role::{AssignmentPeriod, OfficerRole, RoleAssignment, RoleId, RolePatch, RoleTask, TaskPatch};
