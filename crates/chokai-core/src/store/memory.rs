use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::table::Table;
use super::{Record, RecordId, RecordStore, StoreResult, Stored};

/// In-memory record store.
#[derive(Debug)]
pub struct MemoryStore {
    tables: HashMap<&'static str, Table>,
    enforce_unique: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            enforce_unique: true,
        }
    }

    /// A store without the natural-key constraint, as a store that never
    /// declared one behaves under concurrent inserts.
    pub fn without_unique_constraint() -> Self {
        Self {
            tables: HashMap::new(),
            enforce_unique: false,
        }
    }

    /// Number of rows in the collection of `R`.
    pub fn count<R: Record>(&self) -> usize {
        self.tables
            .get(R::COLLECTION)
            .map(|table| table.rows.len())
            .unwrap_or(0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn list<R: Record>(&self) -> StoreResult<Vec<Stored<R>>> {
        match self.tables.get(R::COLLECTION) {
            Some(table) => table.decode(),
            None => Ok(Vec::new()),
        }
    }

    fn insert<R: Record>(&mut self, record: R, now: DateTime<Utc>) -> StoreResult<Stored<R>> {
        let enforce_unique = self.enforce_unique;
        self.tables
            .entry(R::COLLECTION)
            .or_default()
            .insert(record, now, enforce_unique)
    }

    fn update<R: Record>(
        &mut self,
        id: RecordId,
        record: R,
        now: DateTime<Utc>,
    ) -> StoreResult<Stored<R>> {
        let enforce_unique = self.enforce_unique;
        self.tables
            .entry(R::COLLECTION)
            .or_default()
            .update(id, record, now, enforce_unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventId, EventParticipation, MemberId, RsvpStatus};
    use crate::store::StoreError;

    fn rsvp(event: i64, member: i64, status: RsvpStatus) -> EventParticipation {
        EventParticipation {
            event: EventId(event),
            member: MemberId(member),
            child: None,
            status,
            comment: None,
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        let a = store.insert(rsvp(1, 1, RsvpStatus::Attending), now).unwrap();
        let b = store.insert(rsvp(1, 2, RsvpStatus::Maybe), now).unwrap();
        assert_eq!(a.id, RecordId(1));
        assert_eq!(b.id, RecordId(2));
        assert_eq!(store.count::<EventParticipation>(), 2);
    }

    #[test]
    fn test_insert_rejects_duplicate_natural_key() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        store.insert(rsvp(1, 1, RsvpStatus::Attending), now).unwrap();
        let err = store
            .insert(rsvp(1, 1, RsvpStatus::Declined), now)
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
        assert_eq!(store.count::<EventParticipation>(), 1);
    }

    #[test]
    fn test_without_constraint_allows_duplicates() {
        let mut store = MemoryStore::without_unique_constraint();
        let now = Utc::now();
        store.insert(rsvp(1, 1, RsvpStatus::Attending), now).unwrap();
        store.insert(rsvp(1, 1, RsvpStatus::Declined), now).unwrap();
        let found = store
            .find_by_key::<EventParticipation>(&(EventId(1), MemberId(1), None))
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_update_missing_row_is_not_found() {
        let mut store = MemoryStore::new();
        let err = store
            .update(RecordId(9), rsvp(1, 1, RsvpStatus::Maybe), Utc::now())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_update_refreshes_timestamp_and_keeps_created_at() {
        let mut store = MemoryStore::new();
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::minutes(5);
        let stored = store.insert(rsvp(1, 1, RsvpStatus::Attending), t0).unwrap();
        let updated = store
            .update(stored.id, rsvp(1, 1, RsvpStatus::Declined), t1)
            .unwrap();
        assert_eq!(updated.created_at, t0);
        assert_eq!(updated.updated_at, t1);

        let reloaded = store.get::<EventParticipation>(stored.id).unwrap().unwrap();
        assert_eq!(reloaded.record.status, RsvpStatus::Declined);
        assert_eq!(reloaded.updated_at, t1);
    }
}
