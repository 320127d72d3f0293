use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MemberId;
use crate::fiscal::FiscalYear;
use crate::store::{Record, RecordId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub sender: MemberId,
    #[serde(rename = "fiscalYear")]
    pub fiscal_year: FiscalYear,
    #[serde(rename = "sentAt")]
    pub sent_at: DateTime<Utc>,
}

impl Record for Notification {
    const COLLECTION: &'static str = "notifications";
    const UNIQUE_KEY: bool = false;
    type Key = (MemberId, DateTime<Utc>);

    fn key(&self) -> Self::Key {
        (self.sender, self.sent_at)
    }
}

/// One member's copy of a sent notification. Created once at send time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecipient {
    pub notification: RecordId,
    pub member: MemberId,
    /// Opaque token for the mark-read side channel.
    #[serde(rename = "readToken")]
    pub read_token: String,
    #[serde(rename = "readAt", default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl NotificationRecipient {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

impl Record for NotificationRecipient {
    const COLLECTION: &'static str = "notification_recipients";
    type Key = (RecordId, MemberId);

    fn key(&self) -> Self::Key {
        (self.notification, self.member)
    }
}
