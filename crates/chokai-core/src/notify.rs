//! Notification fan-out and the mark-read side channel.
//!
//! Sending is not an upsert: the notification row is inserted once and one
//! recipient row per active guardian is inserted after it. A recipient
//! insert that fails is reported and logged, but the notification itself is
//! kept.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, error, info};

use crate::auth::{require_officer, OfficerPermission};
use crate::error::EngineResult;
use crate::fiscal::FiscalYear;
use crate::models::{Member, MemberId, MemberKind, Notification, NotificationRecipient};
use crate::store::{Record, RecordId, RecordStore, StoreError, Stored};

/// Length of the opaque per-recipient read token.
pub const READ_TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub title: String,
    pub body: String,
    pub fiscal_year: FiscalYear,
}

#[derive(Debug)]
pub struct RecipientFailure {
    pub member: MemberId,
    pub error: StoreError,
}

#[derive(Debug)]
pub struct SendReport {
    pub notification: Stored<Notification>,
    pub recipients: Vec<Stored<NotificationRecipient>>,
    pub failures: Vec<RecipientFailure>,
}

impl SendReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn generate_read_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(READ_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Active guardians, each once, in input order. Children never receive
/// notifications directly.
fn recipients_of(members: &[Member]) -> Vec<MemberId> {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter(|m| m.active && m.kind == MemberKind::Guardian)
        .filter(|m| seen.insert(m.id))
        .map(|m| m.id)
        .collect()
}

/// Send a notification to every currently-active guardian in `members`.
///
/// Fails only when the actor lacks officer permission or the notification
/// row itself cannot be inserted.
pub fn send_notification<S, P>(
    store: &mut S,
    permission: &P,
    actor: MemberId,
    draft: NotificationDraft,
    members: &[Member],
    now: DateTime<Utc>,
) -> EngineResult<SendReport>
where
    S: RecordStore,
    P: OfficerPermission + ?Sized,
{
    require_officer(permission, actor, "send notifications")?;

    let notification = store.insert(
        Notification {
            title: draft.title,
            body: draft.body,
            sender: actor,
            fiscal_year: draft.fiscal_year,
            sent_at: now,
        },
        now,
    )?;

    let mut recipients = Vec::new();
    let mut failures = Vec::new();
    for member in recipients_of(members) {
        let row = NotificationRecipient {
            notification: notification.id,
            member,
            read_token: generate_read_token(),
            read_at: None,
        };
        match store.insert(row, now) {
            Ok(stored) => recipients.push(stored),
            Err(e) => {
                error!(
                    notification = %notification.id,
                    member = %member,
                    error = %e,
                    "Failed to add notification recipient"
                );
                failures.push(RecipientFailure { member, error: e });
            }
        }
    }

    info!(
        notification = %notification.id,
        recipients = recipients.len(),
        failures = failures.len(),
        "Sent notification"
    );
    Ok(SendReport {
        notification,
        recipients,
        failures,
    })
}

/// Mark the recipient holding `token` as read. Repeated calls keep the
/// first read time.
pub fn mark_read<S: RecordStore>(
    store: &mut S,
    token: &str,
    now: DateTime<Utc>,
) -> EngineResult<Stored<NotificationRecipient>> {
    let row = store
        .list::<NotificationRecipient>()?
        .into_iter()
        .find(|row| row.record.read_token == token)
        .ok_or_else(|| StoreError::NotFound {
            collection: NotificationRecipient::COLLECTION,
            id: "read token".to_string(),
        })?;

    if row.record.is_read() {
        debug!(recipient = %row.id, "Notification already read");
        return Ok(row);
    }

    let mut record = row.record;
    record.read_at = Some(now);
    Ok(store.update(row.id, record, now)?)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub recipients: usize,
    pub read: usize,
}

impl ReadSummary {
    pub fn unread(&self) -> usize {
        self.recipients - self.read
    }
}

pub fn read_summary<S: RecordStore>(store: &S, notification: RecordId) -> EngineResult<ReadSummary> {
    let rows: Vec<_> = store
        .list::<NotificationRecipient>()?
        .into_iter()
        .filter(|row| row.record.notification == notification)
        .collect();
    Ok(ReadSummary {
        recipients: rows.len(),
        read: rows.iter().filter(|row| row.record.is_read()).count(),
    })
}
