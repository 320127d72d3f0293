//! Idempotent create-or-update keyed by natural keys.
//!
//! Every mutation the engine performs on keyed records goes through
//! [`upsert_by_key`]: look the key up, update the single match, insert when
//! there is none, and refuse with a retryable conflict when several rows
//! share the key. The store's uniqueness constraint is the backstop for two
//! requests racing to insert the same key.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::auth::{require_officer, OfficerPermission};
use crate::config::OrganizationCalendarConfig;
use crate::error::{EngineError, EngineResult};
use crate::fiscal::FiscalYear;
use crate::models::{
    AssignmentPeriod, CurrentDocument, DocumentRevision, EventId, EventParticipation, MemberId,
    OfficerRole, ParticipationPatch, RoleAssignment, RoleId, RolePatch,
};
use crate::store::{RecordStore, StoreError, Stored, Upsertable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOutcome::Created => write!(f, "created"),
            UpsertOutcome::Updated => write!(f, "updated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<R> {
    pub outcome: UpsertOutcome,
    pub record: Stored<R>,
}

impl<R> Upserted<R> {
    pub fn created(&self) -> bool {
        self.outcome == UpsertOutcome::Created
    }
}

fn duplicate_conflict<R: Upsertable>(key: &R::Key, count: usize) -> EngineError {
    warn!(
        collection = R::COLLECTION,
        key = ?key,
        count,
        "Multiple rows share a natural key"
    );
    EngineError::DuplicateKeyConflict {
        collection: R::COLLECTION,
        key: format!("{:?}", key),
        count,
    }
}

fn update_row<R: Upsertable, S: RecordStore>(
    store: &mut S,
    mut row: Stored<R>,
    patch: R::Patch,
    now: DateTime<Utc>,
) -> EngineResult<Upserted<R>> {
    row.record.apply(patch);
    let record = store.update(row.id, row.record, now)?;
    Ok(Upserted {
        outcome: UpsertOutcome::Updated,
        record,
    })
}

/// Create or update the record identified by `key`.
///
/// Exactly one match is updated in place; no match inserts a new row; more
/// than one match fails with [`EngineError::DuplicateKeyConflict`] and
/// changes nothing. An insert rejected by the store's uniqueness constraint
/// is retried once as an update.
pub fn upsert_by_key<R: Upsertable, S: RecordStore>(
    store: &mut S,
    key: R::Key,
    patch: R::Patch,
    now: DateTime<Utc>,
) -> EngineResult<Upserted<R>> {
    let mut rows = store.find_by_key::<R>(&key)?;
    match rows.len() {
        0 => {
            let record = R::from_key(key.clone(), patch.clone());
            match store.insert(record, now) {
                Ok(record) => {
                    debug!(collection = R::COLLECTION, id = %record.id, "Inserted record");
                    Ok(Upserted {
                        outcome: UpsertOutcome::Created,
                        record,
                    })
                }
                Err(err @ StoreError::UniqueViolation { .. }) => {
                    info!(
                        collection = R::COLLECTION,
                        key = ?key,
                        "Concurrent insert detected, retrying as update"
                    );
                    let mut rows = store.find_by_key::<R>(&key)?;
                    match rows.len() {
                        0 => Err(err.into()),
                        1 => update_row(store, rows.remove(0), patch, now),
                        count => Err(duplicate_conflict::<R>(&key, count)),
                    }
                }
                Err(err) => Err(err.into()),
            }
        }
        1 => update_row(store, rows.remove(0), patch, now),
        count => Err(duplicate_conflict::<R>(&key, count)),
    }
}

/// Update the most recently updated row of a "single current version"
/// collection, inserting the first row when the collection is empty. Older
/// rows are left untouched.
pub fn upsert_latest<R, S>(
    store: &mut S,
    patch: R::Patch,
    now: DateTime<Utc>,
) -> EngineResult<Upserted<R>>
where
    R: Upsertable<Key = ()>,
    S: RecordStore,
{
    let latest = store
        .list::<R>()?
        .into_iter()
        .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));

    match latest {
        Some(row) => update_row(store, row, patch, now),
        None => {
            let record = store.insert(R::from_key((), patch), now)?;
            Ok(Upserted {
                outcome: UpsertOutcome::Created,
                record,
            })
        }
    }
}

// ============================================================================
// Typed entry points
// ============================================================================

/// Record an RSVP. `child` scopes the response to one child; `None` is the
/// guardian-level response. Guardian-level and child-scoped responses for
/// the same event are distinct records.
pub fn record_rsvp<S: RecordStore>(
    store: &mut S,
    event: EventId,
    member: MemberId,
    child: Option<MemberId>,
    patch: ParticipationPatch,
    now: DateTime<Utc>,
) -> EngineResult<Upserted<EventParticipation>> {
    let result = upsert_by_key::<EventParticipation, _>(store, (event, member, child), patch, now)?;
    debug!(
        event = %event,
        member = %member,
        outcome = %result.outcome,
        status = %result.record.record.status,
        "Recorded RSVP"
    );
    Ok(result)
}

/// Upsert the officer role table. Safe to run on every bootstrap.
pub fn seed_roles<S, P>(
    store: &mut S,
    permission: &P,
    actor: MemberId,
    roles: &[OfficerRole],
    now: DateTime<Utc>,
) -> EngineResult<Vec<Upserted<OfficerRole>>>
where
    S: RecordStore,
    P: OfficerPermission + ?Sized,
{
    require_officer(permission, actor, "seed officer roles")?;
    let mut results = Vec::with_capacity(roles.len());
    for role in roles {
        results.push(upsert_by_key::<OfficerRole, _>(
            store,
            role.id.clone(),
            RolePatch::from(role),
            now,
        )?);
    }
    info!(
        count = results.len(),
        created = results.iter().filter(|r| r.created()).count(),
        "Seeded officer roles"
    );
    Ok(results)
}

/// Assign `member` to `role` for the whole of `fiscal_year`.
#[allow(clippy::too_many_arguments)]
pub fn assign_role<S, P>(
    store: &mut S,
    permission: &P,
    actor: MemberId,
    member: MemberId,
    role: RoleId,
    fiscal_year: FiscalYear,
    calendar: &OrganizationCalendarConfig,
    now: DateTime<Utc>,
) -> EngineResult<Upserted<RoleAssignment>>
where
    S: RecordStore,
    P: OfficerPermission + ?Sized,
{
    require_officer(permission, actor, "assign officer roles")?;
    let (start_date, end_date) = fiscal_year
        .period(calendar.fiscal_year_start_month)
        .ok_or(EngineError::FiscalYearOutOfRange(fiscal_year))?;
    upsert_by_key::<RoleAssignment, _>(
        store,
        (member, role, fiscal_year),
        AssignmentPeriod {
            start_date,
            end_date,
        },
        now,
    )
}

/// Replace the current constitution / bylaws text.
pub fn revise_document<S, P>(
    store: &mut S,
    permission: &P,
    revision: DocumentRevision,
    now: DateTime<Utc>,
) -> EngineResult<Upserted<CurrentDocument>>
where
    S: RecordStore,
    P: OfficerPermission + ?Sized,
{
    require_officer(permission, revision.revised_by, "revise the constitution")?;
    upsert_latest::<CurrentDocument, _>(store, revision, now)
}
