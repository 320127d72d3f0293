use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::table::Table;
use super::{Record, RecordId, RecordStore, StoreError, StoreResult, Stored};

/// JSON-file record store: one `<collection>.json` file per collection.
///
/// Every write rewrites the collection through a temporary file followed by a
/// rename, so a failed write leaves the previous file intact.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> StoreResult<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    fn load_table<R: Record>(&self) -> StoreResult<Table> {
        let path = self.collection_path(R::COLLECTION);
        if !path.exists() {
            return Ok(Table::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Serialization {
            collection: R::COLLECTION,
            source,
        })
    }

    fn save_table<R: Record>(&self, table: &mut Table, now: DateTime<Utc>) -> StoreResult<()> {
        table.saved_at = Some(now);
        let contents =
            serde_json::to_string_pretty(table).map_err(|source| StoreError::Serialization {
                collection: R::COLLECTION,
                source,
            })?;
        let path = self.collection_path(R::COLLECTION);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &path)?;
        debug!(collection = R::COLLECTION, rows = table.rows.len(), "Saved collection");
        Ok(())
    }

    /// When the collection of `R` was last written, if ever.
    pub fn saved_at<R: Record>(&self) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self.load_table::<R>()?.saved_at)
    }
}

impl RecordStore for FileStore {
    fn list<R: Record>(&self) -> StoreResult<Vec<Stored<R>>> {
        self.load_table::<R>()?.decode()
    }

    fn insert<R: Record>(&mut self, record: R, now: DateTime<Utc>) -> StoreResult<Stored<R>> {
        let mut table = self.load_table::<R>()?;
        let stored = table.insert(record, now, true)?;
        self.save_table::<R>(&mut table, now)?;
        Ok(stored)
    }

    fn update<R: Record>(
        &mut self,
        id: RecordId,
        record: R,
        now: DateTime<Utc>,
    ) -> StoreResult<Stored<R>> {
        let mut table = self.load_table::<R>()?;
        let stored = table.update(id, record, now, true)?;
        self.save_table::<R>(&mut table, now)?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Member, MemberId};

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        {
            let mut store = FileStore::new(dir.path().to_path_buf()).unwrap();
            store
                .insert(Member::guardian(MemberId(1), "山田 太郎"), now)
                .unwrap();
        }

        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let members = store.list::<Member>().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].record.display_name, "山田 太郎");
        assert_eq!(store.saved_at::<Member>().unwrap(), Some(now));
    }

    #[test]
    fn test_file_store_missing_collection_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.list::<Member>().unwrap().is_empty());
        assert_eq!(store.saved_at::<Member>().unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_collection() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("members.json"), "{not json").unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let err = store.list::<Member>().unwrap_err();
        assert!(matches!(err, StoreError::Serialization { collection: "members", .. }));
    }

    #[test]
    fn test_file_store_enforces_unique_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let now = Utc::now();
        store.insert(Member::guardian(MemberId(1), "A"), now).unwrap();
        let err = store.insert(Member::guardian(MemberId(1), "B"), now).unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
    }
}
