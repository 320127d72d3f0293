//! Fiscal-year rollover: stage next year's officer assignments and
//! recurring role tasks from the current year, for officer review.
//!
//! Preparation is pure. Nothing is written until [`commit_drafts`] runs,
//! and committing goes through the upsert coordinator so re-running a
//! rollover never duplicates rows.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{debug, info};

use crate::auth::{require_officer, OfficerPermission};
use crate::config::OrganizationCalendarConfig;
use crate::error::{EngineError, EngineResult};
use crate::fiscal::FiscalYear;
use crate::models::{
    AssignmentPeriod, MemberId, OfficerRole, RoleAssignment, RoleId, RoleTask, TaskPatch,
};
use crate::store::{RecordStore, Stored};
use crate::upsert::{upsert_by_key, UpsertOutcome};

/// A staged assignment for the target year, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftAssignment {
    pub member: MemberId,
    pub role: RoleId,
    /// Role name for display; `None` when the role is no longer defined.
    pub role_name: Option<String>,
    pub fiscal_year: FiscalYear,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DraftAssignment {
    pub fn to_assignment(&self) -> RoleAssignment {
        RoleAssignment {
            member: self.member,
            role: self.role.clone(),
            fiscal_year: self.fiscal_year,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Role ordering for drafts: known roles by canonical order, unknown roles
/// last, then role id.
fn compare_roles(
    roles: &HashMap<&RoleId, &OfficerRole>,
    a: &RoleId,
    b: &RoleId,
) -> Ordering {
    match (roles.get(a), roles.get(b)) {
        (Some(ra), Some(rb)) => ra.canonical_cmp(rb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.cmp(b))
}

/// Draft next year's assignments from the current ones.
///
/// Each role carries forward the occupants of its latest fiscal year before
/// `target`, so a member replaced in a later year is not drafted again.
/// One draft per distinct (member, role). Pairs already entered for
/// `target` in `existing_target` are skipped so user-entered rows are never
/// overwritten. Drafts span the whole target fiscal year.
pub fn prepare_next_year(
    current: &[RoleAssignment],
    existing_target: &[RoleAssignment],
    roles: &[OfficerRole],
    target: FiscalYear,
    calendar: &OrganizationCalendarConfig,
) -> EngineResult<Vec<DraftAssignment>> {
    let (start_date, end_date) = target
        .period(calendar.fiscal_year_start_month)
        .ok_or(EngineError::FiscalYearOutOfRange(target))?;

    let role_table: HashMap<&RoleId, &OfficerRole> =
        roles.iter().map(|role| (&role.id, role)).collect();
    let already_entered: HashSet<(MemberId, &RoleId)> = existing_target
        .iter()
        .filter(|a| a.fiscal_year == target)
        .map(|a| (a.member, &a.role))
        .collect();

    let mut latest_year: HashMap<&RoleId, FiscalYear> = HashMap::new();
    for assignment in current.iter().filter(|a| a.fiscal_year < target) {
        let year = latest_year
            .entry(&assignment.role)
            .or_insert(assignment.fiscal_year);
        *year = (*year).max(assignment.fiscal_year);
    }

    let mut seen: HashSet<(MemberId, &RoleId)> = HashSet::new();
    let mut drafts = Vec::new();
    for assignment in current
        .iter()
        .filter(|a| latest_year.get(&a.role) == Some(&a.fiscal_year))
    {
        let pair = (assignment.member, &assignment.role);
        if already_entered.contains(&pair) {
            debug!(
                member = %assignment.member,
                role = %assignment.role,
                fiscal_year = %target,
                "Assignment already entered for target year, skipping"
            );
            continue;
        }
        if !seen.insert(pair) {
            continue;
        }
        drafts.push(DraftAssignment {
            member: assignment.member,
            role: assignment.role.clone(),
            role_name: role_table.get(&assignment.role).map(|r| r.name.clone()),
            fiscal_year: target,
            start_date,
            end_date,
        });
    }

    drafts.sort_by(|a, b| {
        compare_roles(&role_table, &a.role, &b.role).then_with(|| a.member.cmp(&b.member))
    });
    Ok(drafts)
}

/// Shift a due date by whole years, clamping Feb 29 to Feb 28.
fn shift_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year().checked_add(years)?;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
}

/// Copy recurring role tasks forward into `target`, skipping titles the
/// target year already has for the same role.
pub fn prepare_next_year_tasks(
    current: &[RoleTask],
    existing_target: &[RoleTask],
    target: FiscalYear,
) -> Vec<RoleTask> {
    let already_entered: HashSet<(&RoleId, &str)> = existing_target
        .iter()
        .filter(|t| t.fiscal_year == target)
        .map(|t| (&t.role, t.title.as_str()))
        .collect();

    let mut seen = HashSet::new();
    let mut tasks = Vec::new();
    for task in current.iter().filter(|t| t.fiscal_year < target) {
        let pair = (&task.role, task.title.as_str());
        if already_entered.contains(&pair) || !seen.insert(pair) {
            continue;
        }
        let delta = target.year().checked_sub(task.fiscal_year.year());
        tasks.push(RoleTask {
            role: task.role.clone(),
            title: task.title.clone(),
            fiscal_year: target,
            due_date: task
                .due_date
                .zip(delta)
                .and_then(|(due, years)| shift_years(due, years)),
            notes: task.notes.clone(),
        });
    }
    tasks
}

/// Everything a rollover into `target` would stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RolloverPlan {
    pub assignments: Vec<DraftAssignment>,
    pub tasks: Vec<RoleTask>,
}

impl RolloverPlan {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.tasks.is_empty()
    }
}

fn records<R>(rows: Vec<Stored<R>>) -> Vec<R> {
    rows.into_iter().map(|stored| stored.record).collect()
}

/// Load the year before `target` and the rows already entered for
/// `target`, then prepare the plan.
pub fn prepare_from_store<S: RecordStore>(
    store: &S,
    target: FiscalYear,
    calendar: &OrganizationCalendarConfig,
) -> EngineResult<RolloverPlan> {
    let source = target.previous();
    let (current, existing): (Vec<RoleAssignment>, Vec<RoleAssignment>) =
        records(store.list::<RoleAssignment>()?)
            .into_iter()
            .filter(|a| a.fiscal_year == source || a.fiscal_year == target)
            .partition(|a| a.fiscal_year == source);
    let (current_tasks, existing_tasks): (Vec<RoleTask>, Vec<RoleTask>) =
        records(store.list::<RoleTask>()?)
            .into_iter()
            .filter(|t| t.fiscal_year == source || t.fiscal_year == target)
            .partition(|t| t.fiscal_year == source);
    let roles = records(store.list::<OfficerRole>()?);

    let plan = RolloverPlan {
        assignments: prepare_next_year(&current, &existing, &roles, target, calendar)?,
        tasks: prepare_next_year_tasks(&current_tasks, &existing_tasks, target),
    };
    debug!(
        from = %source,
        to = %target,
        assignments = plan.assignments.len(),
        tasks = plan.tasks.len(),
        "Prepared rollover"
    );
    Ok(plan)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RolloverReport {
    pub assignments_created: usize,
    pub assignments_updated: usize,
    pub tasks_created: usize,
    pub tasks_updated: usize,
}

fn tally(outcome: UpsertOutcome, created: &mut usize, updated: &mut usize) {
    match outcome {
        UpsertOutcome::Created => *created += 1,
        UpsertOutcome::Updated => *updated += 1,
    }
}

/// Persist a reviewed plan. Requires officer permission.
pub fn commit_drafts<S, P>(
    store: &mut S,
    permission: &P,
    actor: MemberId,
    plan: &RolloverPlan,
    now: DateTime<Utc>,
) -> EngineResult<RolloverReport>
where
    S: RecordStore,
    P: OfficerPermission + ?Sized,
{
    require_officer(permission, actor, "commit a fiscal-year rollover")?;

    let mut report = RolloverReport::default();
    for draft in &plan.assignments {
        let result = upsert_by_key::<RoleAssignment, _>(
            store,
            (draft.member, draft.role.clone(), draft.fiscal_year),
            AssignmentPeriod {
                start_date: draft.start_date,
                end_date: draft.end_date,
            },
            now,
        )?;
        tally(
            result.outcome,
            &mut report.assignments_created,
            &mut report.assignments_updated,
        );
    }
    for task in &plan.tasks {
        let result = upsert_by_key::<RoleTask, _>(
            store,
            (task.role.clone(), task.title.clone(), task.fiscal_year),
            TaskPatch {
                due_date: task.due_date,
                notes: task.notes.clone(),
            },
            now,
        )?;
        tally(result.outcome, &mut report.tasks_created, &mut report.tasks_updated);
    }

    info!(
        actor = %actor,
        assignments = report.assignments_created + report.assignments_updated,
        tasks = report.tasks_created + report.tasks_updated,
        "Committed rollover"
    );
    Ok(report)
}
