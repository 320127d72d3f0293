//! Roster ordering and participation merging.
//!
//! Rosters are ordered by grade order, then by name under Japanese
//! collation. Sorting is stable and pure: inputs are never mutated and
//! entries with equal keys keep their relative order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::fiscal::FiscalYear;
use crate::grade::{resolve_grade, Grade};
use crate::models::{EventId, EventParticipation, Member, MemberId, RsvpStatus};
use crate::store::{RecordId, Stored};
use crate::utils::NameCollator;

/// Placeholder for a child reference that no longer resolves.
pub const UNKNOWN_CHILD_LABEL: &str = "不明なお子様";

/// Placeholder for a member reference that no longer resolves.
pub const UNKNOWN_MEMBER_LABEL: &str = "不明な会員";

pub trait RosterSortKey {
    fn grade_order(&self) -> u8;
    fn sort_name(&self) -> &str;
}

/// Stable sort by (grade order, collated name) into a new vector.
pub fn sort_roster<T: RosterSortKey + Clone>(entries: &[T]) -> Vec<T> {
    let collator = NameCollator::japanese();
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        a.grade_order()
            .cmp(&b.grade_order())
            .then_with(|| collator.compare(a.sort_name(), b.sort_name()))
    });
    sorted
}

// ============================================================================
// Event participation roster
// ============================================================================

/// One RSVP row joined with its guardian and child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub participation: RecordId,
    pub event: EventId,
    pub member: MemberId,
    pub child: Option<MemberId>,
    /// Name of the person attending: the child for child-scoped rows,
    /// otherwise the guardian.
    pub display_name: String,
    pub sort_name: String,
    pub guardian_name: String,
    pub grade: Grade,
    pub status: RsvpStatus,
    pub updated_at: DateTime<Utc>,
}

impl RosterSortKey for RosterEntry {
    fn grade_order(&self) -> u8 {
        self.grade.order
    }

    fn sort_name(&self) -> &str {
        &self.sort_name
    }
}

fn index_members(members: &[Member]) -> HashMap<MemberId, &Member> {
    members.iter().map(|m| (m.id, m)).collect()
}

/// Join participation rows with member records and sort them.
///
/// Missing guardians and children are replaced by placeholder labels with
/// an unknown grade; the entry stays in the listing.
pub fn merge_participation(
    participations: &[Stored<EventParticipation>],
    members: &[Member],
    fiscal_year: FiscalYear,
) -> Vec<RosterEntry> {
    let by_id = index_members(members);

    let entries: Vec<RosterEntry> = participations
        .iter()
        .map(|stored| {
            let row = &stored.record;
            let guardian = by_id.get(&row.member).copied();
            if guardian.is_none() {
                debug!(member = %row.member, event = %row.event, "Participation references unknown member");
            }
            let guardian_name = guardian
                .map(|g| g.display_name.clone())
                .unwrap_or_else(|| UNKNOWN_MEMBER_LABEL.to_string());

            let (display_name, sort_name, grade) = match row.child {
                Some(child_id) => match by_id.get(&child_id) {
                    Some(child) => (
                        child.display_name.clone(),
                        child.sort_name().to_string(),
                        resolve_grade(child.birthdate, fiscal_year),
                    ),
                    None => {
                        debug!(child = %child_id, event = %row.event, "Participation references removed child");
                        (
                            UNKNOWN_CHILD_LABEL.to_string(),
                            UNKNOWN_CHILD_LABEL.to_string(),
                            resolve_grade(None, fiscal_year),
                        )
                    }
                },
                None => match guardian {
                    Some(g) => (
                        g.display_name.clone(),
                        g.sort_name().to_string(),
                        resolve_grade(g.birthdate, fiscal_year),
                    ),
                    None => (
                        UNKNOWN_MEMBER_LABEL.to_string(),
                        UNKNOWN_MEMBER_LABEL.to_string(),
                        resolve_grade(None, fiscal_year),
                    ),
                },
            };

            RosterEntry {
                participation: stored.id,
                event: row.event,
                member: row.member,
                child: row.child,
                display_name,
                sort_name,
                guardian_name,
                grade,
                status: row.status,
                updated_at: stored.updated_at,
            }
        })
        .collect();

    sort_roster(&entries)
}

/// RSVP counts for an event roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub attending: usize,
    pub declined: usize,
    pub maybe: usize,
}

impl AttendanceSummary {
    pub fn total(&self) -> usize {
        self.attending + self.declined + self.maybe
    }
}

pub fn attendance_summary(entries: &[RosterEntry]) -> AttendanceSummary {
    entries
        .iter()
        .fold(AttendanceSummary::default(), |mut summary, entry| {
            match entry.status {
                RsvpStatus::Attending => summary.attending += 1,
                RsvpStatus::Declined => summary.declined += 1,
                RsvpStatus::Maybe => summary.maybe += 1,
            }
            summary
        })
}

// ============================================================================
// Member directory roster
// ============================================================================

/// An active child with the grade for the working fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRow {
    pub member: MemberId,
    pub display_name: String,
    pub sort_name: String,
    pub guardian_name: String,
    pub grade: Grade,
}

impl RosterSortKey for MemberRow {
    fn grade_order(&self) -> u8 {
        self.grade.order
    }

    fn sort_name(&self) -> &str {
        &self.sort_name
    }
}

/// Active children with grades for `fiscal_year`, sorted.
pub fn member_roster(members: &[Member], fiscal_year: FiscalYear) -> Vec<MemberRow> {
    let by_id = index_members(members);

    let rows: Vec<MemberRow> = members
        .iter()
        .filter(|m| m.active && m.is_child())
        .map(|child| MemberRow {
            member: child.id,
            display_name: child.display_name.clone(),
            sort_name: child.sort_name().to_string(),
            guardian_name: child
                .guardian
                .and_then(|id| by_id.get(&id))
                .map(|g| g.display_name.clone())
                .unwrap_or_else(|| UNKNOWN_MEMBER_LABEL.to_string()),
            grade: resolve_grade(child.birthdate, fiscal_year),
        })
        .collect();

    sort_roster(&rows)
}
