use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::{Record, Upsertable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub i64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Guardian,
    Child,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Guardian => write!(f, "Guardian"),
            MemberKind::Child => write!(f, "Child"),
        }
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Kana reading of the name, used for collation when present.
    #[serde(default)]
    pub kana: Option<String>,
    pub kind: MemberKind,
    /// Owning guardian; set for children only.
    #[serde(default)]
    pub guardian: Option<MemberId>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Member {
    pub fn guardian(id: MemberId, display_name: &str) -> Self {
        Self {
            id,
            display_name: display_name.to_string(),
            kana: None,
            kind: MemberKind::Guardian,
            guardian: None,
            birthdate: None,
            active: true,
        }
    }

    pub fn child(
        id: MemberId,
        display_name: &str,
        guardian: MemberId,
        birthdate: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.to_string(),
            kana: None,
            kind: MemberKind::Child,
            guardian: Some(guardian),
            birthdate,
            active: true,
        }
    }

    pub fn with_kana(mut self, kana: &str) -> Self {
        self.kana = Some(kana.to_string());
        self
    }

    pub fn is_child(&self) -> bool {
        self.kind == MemberKind::Child
    }

    /// Name used for ordering: the kana reading when known, else the display name.
    pub fn sort_name(&self) -> &str {
        self.kana
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or(&self.display_name)
    }
}

/// Replacement member fields, keyed by `MemberId`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberPatch {
    pub display_name: String,
    pub kana: Option<String>,
    pub kind: MemberKind,
    pub guardian: Option<MemberId>,
    pub birthdate: Option<NaiveDate>,
    pub active: bool,
}

impl Record for Member {
    const COLLECTION: &'static str = "members";
    type Key = MemberId;

    fn key(&self) -> MemberId {
        self.id
    }
}

impl Upsertable for Member {
    type Patch = MemberPatch;

    fn from_key(id: MemberId, patch: MemberPatch) -> Self {
        let mut member = Member::guardian(id, "");
        member.apply(patch);
        member
    }

    fn apply(&mut self, patch: MemberPatch) {
        self.display_name = patch.display_name;
        self.kana = patch.kana;
        self.kind = patch.kind;
        self.guardian = patch.guardian;
        self.birthdate = patch.birthdate;
        self.active = patch.active;
    }
}
