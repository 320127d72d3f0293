use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::MemberId;
use crate::fiscal::FiscalYear;
use crate::store::{Record, Upsertable};

/// Role slug, e.g. `chair` or `treasurer`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub String);

impl RoleId {
    pub fn new(slug: &str) -> Self {
        Self(slug.to_string())
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerRole {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "displayOrder")]
    pub display_order: i32,
}

impl OfficerRole {
    pub fn new(id: &str, name: &str, display_order: i32) -> Self {
        Self {
            id: RoleId::new(id),
            name: name.to_string(),
            description: String::new(),
            display_order,
        }
    }

    /// Canonical presentation order: display order, then name.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.display_order
            .cmp(&other.display_order)
            .then_with(|| self.name.cmp(&other.name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RolePatch {
    pub name: String,
    pub description: String,
    pub display_order: i32,
}

impl From<&OfficerRole> for RolePatch {
    fn from(role: &OfficerRole) -> Self {
        Self {
            name: role.name.clone(),
            description: role.description.clone(),
            display_order: role.display_order,
        }
    }
}

impl Record for OfficerRole {
    const COLLECTION: &'static str = "officer_roles";
    type Key = RoleId;

    fn key(&self) -> RoleId {
        self.id.clone()
    }
}

impl Upsertable for OfficerRole {
    type Patch = RolePatch;

    fn from_key(id: RoleId, patch: RolePatch) -> Self {
        Self {
            id,
            name: patch.name,
            description: patch.description,
            display_order: patch.display_order,
        }
    }

    fn apply(&mut self, patch: RolePatch) {
        self.name = patch.name;
        self.description = patch.description;
        self.display_order = patch.display_order;
    }
}

/// A member holding a role for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub member: MemberId,
    pub role: RoleId,
    #[serde(rename = "fiscalYear")]
    pub fiscal_year: FiscalYear,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Record for RoleAssignment {
    const COLLECTION: &'static str = "role_assignments";
    type Key = (MemberId, RoleId, FiscalYear);

    fn key(&self) -> Self::Key {
        (self.member, self.role.clone(), self.fiscal_year)
    }
}

impl Upsertable for RoleAssignment {
    type Patch = AssignmentPeriod;

    fn from_key((member, role, fiscal_year): Self::Key, period: AssignmentPeriod) -> Self {
        Self {
            member,
            role,
            fiscal_year,
            start_date: period.start_date,
            end_date: period.end_date,
        }
    }

    fn apply(&mut self, period: AssignmentPeriod) {
        self.start_date = period.start_date;
        self.end_date = period.end_date;
    }
}

/// A recurring duty attached to a role, carried forward each fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTask {
    pub role: RoleId,
    pub title: String,
    #[serde(rename = "fiscalYear")]
    pub fiscal_year: FiscalYear,
    #[serde(rename = "dueDate", default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskPatch {
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Record for RoleTask {
    const COLLECTION: &'static str = "role_tasks";
    type Key = (RoleId, String, FiscalYear);

    fn key(&self) -> Self::Key {
        (self.role.clone(), self.title.clone(), self.fiscal_year)
    }
}

impl Upsertable for RoleTask {
    type Patch = TaskPatch;

    fn from_key((role, title, fiscal_year): Self::Key, patch: TaskPatch) -> Self {
        Self {
            role,
            title,
            fiscal_year,
            due_date: patch.due_date,
            notes: patch.notes,
        }
    }

    fn apply(&mut self, patch: TaskPatch) {
        self.due_date = patch.due_date;
        self.notes = patch.notes;
    }
}
