use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Record, RecordId, StoreError, StoreResult, Stored};

/// Untyped rows of one collection, shared by the memory and file stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Table {
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    pub next_id: u64,
    pub rows: Vec<Stored<Value>>,
}

impl Table {
    pub fn decode<R: Record>(&self) -> StoreResult<Vec<Stored<R>>> {
        self.rows.iter().map(decode_row::<R>).collect()
    }

    pub fn insert<R: Record>(
        &mut self,
        record: R,
        now: DateTime<Utc>,
        enforce_unique: bool,
    ) -> StoreResult<Stored<R>> {
        if enforce_unique && R::UNIQUE_KEY {
            self.check_unique(&record, None)?;
        }
        let value = encode(&record)?;
        self.next_id += 1;
        let id = RecordId(self.next_id);
        self.rows.push(Stored {
            id,
            record: value,
            created_at: now,
            updated_at: now,
        });
        Ok(Stored {
            id,
            record,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update<R: Record>(
        &mut self,
        id: RecordId,
        record: R,
        now: DateTime<Utc>,
        enforce_unique: bool,
    ) -> StoreResult<Stored<R>> {
        if enforce_unique && R::UNIQUE_KEY {
            self.check_unique(&record, Some(id))?;
        }
        let value = encode(&record)?;
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: R::COLLECTION,
                id: id.to_string(),
            })?;
        row.record = value;
        row.updated_at = now;
        Ok(Stored {
            id,
            record,
            created_at: row.created_at,
            updated_at: now,
        })
    }

    fn check_unique<R: Record>(&self, record: &R, except: Option<RecordId>) -> StoreResult<()> {
        let key = record.key();
        for row in self.rows.iter().filter(|row| Some(row.id) != except) {
            let existing = decode_row::<R>(row)?;
            if existing.record.key() == key {
                return Err(StoreError::UniqueViolation {
                    collection: R::COLLECTION,
                    key: format!("{:?}", key),
                });
            }
        }
        Ok(())
    }
}

fn encode<R: Record>(record: &R) -> StoreResult<Value> {
    serde_json::to_value(record).map_err(|source| StoreError::Serialization {
        collection: R::COLLECTION,
        source,
    })
}

fn decode_row<R: Record>(row: &Stored<Value>) -> StoreResult<Stored<R>> {
    let record = serde_json::from_value(row.record.clone()).map_err(|source| {
        StoreError::Serialization {
            collection: R::COLLECTION,
            source,
        }
    })?;
    Ok(Stored {
        id: row.id,
        record,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
