use serde::{Deserialize, Serialize};

use super::MemberId;
use crate::store::{Record, Upsertable};

/// Constitution / bylaws text. Only the most recently updated row is current;
/// older rows may exist from legacy imports and are never consulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentDocument {
    pub title: String,
    pub body: String,
    #[serde(rename = "revisedBy")]
    pub revised_by: MemberId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRevision {
    pub title: String,
    pub body: String,
    pub revised_by: MemberId,
}

impl Record for CurrentDocument {
    const COLLECTION: &'static str = "documents";
    const UNIQUE_KEY: bool = false;
    type Key = ();

    fn key(&self) {}
}

impl Upsertable for CurrentDocument {
    type Patch = DocumentRevision;

    fn from_key(_: (), revision: DocumentRevision) -> Self {
        Self {
            title: revision.title,
            body: revision.body,
            revised_by: revision.revised_by,
        }
    }

    fn apply(&mut self, revision: DocumentRevision) {
        self.title = revision.title;
        self.body = revision.body;
        self.revised_by = revision.revised_by;
    }
}
