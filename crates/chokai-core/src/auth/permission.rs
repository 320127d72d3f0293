use std::collections::HashSet;

use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::fiscal::FiscalYear;
use crate::models::{MemberId, RoleAssignment};
use crate::store::{RecordStore, StoreResult};

/// Capability check for officer-only mutations.
pub trait OfficerPermission {
    fn has_officer_permission(&self, member: MemberId) -> bool;
}

impl<F> OfficerPermission for F
where
    F: Fn(MemberId) -> bool,
{
    fn has_officer_permission(&self, member: MemberId) -> bool {
        self(member)
    }
}

/// Grants every member officer permission (bootstrap and tests).
pub struct AllowAll;

impl OfficerPermission for AllowAll {
    fn has_officer_permission(&self, _member: MemberId) -> bool {
        true
    }
}

/// Members holding any role in a given fiscal year.
#[derive(Debug, Clone)]
pub struct OfficerRoster {
    fiscal_year: FiscalYear,
    officers: HashSet<MemberId>,
}

impl OfficerRoster {
    pub fn from_assignments(assignments: &[RoleAssignment], fiscal_year: FiscalYear) -> Self {
        let officers = assignments
            .iter()
            .filter(|a| a.fiscal_year == fiscal_year)
            .map(|a| a.member)
            .collect();
        Self {
            fiscal_year,
            officers,
        }
    }

    pub fn from_store<S: RecordStore>(store: &S, fiscal_year: FiscalYear) -> StoreResult<Self> {
        let assignments: Vec<RoleAssignment> = store
            .list::<RoleAssignment>()?
            .into_iter()
            .map(|stored| stored.record)
            .collect();
        Ok(Self::from_assignments(&assignments, fiscal_year))
    }

    pub fn fiscal_year(&self) -> FiscalYear {
        self.fiscal_year
    }
}

impl OfficerPermission for OfficerRoster {
    fn has_officer_permission(&self, member: MemberId) -> bool {
        self.officers.contains(&member)
    }
}

/// Refuse `action` unless `actor` passes the officer check.
pub fn require_officer<P: OfficerPermission + ?Sized>(
    permission: &P,
    actor: MemberId,
    action: &str,
) -> EngineResult<()> {
    if permission.has_officer_permission(actor) {
        Ok(())
    } else {
        warn!(actor = %actor, action, "Officer permission denied");
        Err(EngineError::PermissionDenied(format!(
            "member {} may not {}",
            actor, action
        )))
    }
}
