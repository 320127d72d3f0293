//! Record store boundary.
//!
//! The engine never touches untyped rows: every collection is decoded into a
//! typed [`Record`] at this boundary. Two stores are provided:
//!
//! - `MemoryStore`: request-scoped / test store, optionally without the
//!   natural-key uniqueness constraint
//! - `FileStore`: one JSON file per collection under a data directory
//!
//! Both enforce one row per natural key for records with
//! [`Record::UNIQUE_KEY`] set, as the backstop the upsert coordinator relies on.

pub mod error;
pub mod file;
pub mod memory;
mod table;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Store-assigned row identifier, unique within a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed entity persisted in a named collection.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Collection (table / file) name.
    const COLLECTION: &'static str;

    /// Whether the store enforces at most one row per natural key.
    const UNIQUE_KEY: bool = true;

    /// Natural key: the foreign identifiers that are unique together.
    type Key: Clone + PartialEq + fmt::Debug;

    fn key(&self) -> Self::Key;
}

/// A record that can be created from its natural key plus a payload, and
/// updated in place by applying that payload.
pub trait Upsertable: Record {
    type Patch: Clone;

    fn from_key(key: Self::Key, patch: Self::Patch) -> Self;

    fn apply(&mut self, patch: Self::Patch);
}

/// A record together with its store metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<R> {
    pub id: RecordId,
    pub record: R,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub trait RecordStore {
    /// All rows of a collection in insertion order.
    fn list<R: Record>(&self) -> StoreResult<Vec<Stored<R>>>;

    /// Insert a new row. Fails with `UniqueViolation` when the store enforces
    /// the natural key and a row with the same key exists.
    fn insert<R: Record>(&mut self, record: R, now: DateTime<Utc>) -> StoreResult<Stored<R>>;

    /// Replace the row with the given id, refreshing `updated_at`.
    fn update<R: Record>(
        &mut self,
        id: RecordId,
        record: R,
        now: DateTime<Utc>,
    ) -> StoreResult<Stored<R>>;

    /// Every row whose natural key equals `key`.
    fn find_by_key<R: Record>(&self, key: &R::Key) -> StoreResult<Vec<Stored<R>>> {
        Ok(self
            .list::<R>()?
            .into_iter()
            .filter(|stored| stored.record.key() == *key)
            .collect())
    }

    fn get<R: Record>(&self, id: RecordId) -> StoreResult<Option<Stored<R>>> {
        Ok(self.list::<R>()?.into_iter().find(|stored| stored.id == id))
    }
}
