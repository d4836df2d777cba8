use crate::types::{Hours, ProgressKey, ProgressRecord};
use anyhow::{Context, Result};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::PathBuf;
use std::sync::Arc;

/// (user_id, topic, day as YYYY-MM-DD) -> JSON encoded ProgressRecord
const PROGRESS_TABLE: TableDefinition<(&str, &str, &str), &[u8]> =
    TableDefinition::new("study_progress");

/// Outcome of adding hours to a day's record
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// No record existed for the key; one was created with the added hours.
    Created(ProgressRecord),
    /// An existing record was incremented.
    Incremented {
        previous: Hours,
        record: ProgressRecord,
    },
}

impl ProgressUpdate {
    pub fn record(&self) -> &ProgressRecord {
        match self {
            Self::Created(record) => record,
            Self::Incremented { record, .. } => record,
        }
    }
}

/// Persistent store of per-day study progress
pub trait ProgressStore: Send + Sync {
    /// Get the record for a key
    fn get(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>>;

    /// Atomically add hours to the record for a key, creating it if absent
    fn add_hours(&self, key: &ProgressKey, hours: Hours) -> Result<ProgressUpdate>;

    /// List every record of a user, most recent day first
    fn list_for_user(&self, user_id: &str) -> Result<Vec<ProgressRecord>>;
}

/// Progress store backed by redb.
///
/// redb admits one write transaction at a time, so the read-modify-write in
/// [`RedbProgressStore::add_hours`] is serialized against every other writer
/// and concurrent contributions to the same key cannot overwrite each other.
#[derive(Clone)]
pub struct RedbProgressStore {
    db: Arc<Database>,
}

impl RedbProgressStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create progress store directory")?;
        }

        let db = Database::create(&path).context("Failed to create redb database")?;

        let write_txn = db.begin_write().context("Failed to begin write transaction")?;
        {
            let _progress_table = write_txn
                .open_table(PROGRESS_TABLE)
                .context("Failed to open progress table")?;
        }
        write_txn.commit().context("Failed to commit transaction")?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn get(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>> {
        let read_txn = self.db.begin_read().context("Failed to begin read")?;
        let table = read_txn
            .open_table(PROGRESS_TABLE)
            .context("Failed to open table")?;

        let day = key.day_label();
        let value = table
            .get((key.user_id.as_str(), key.topic.as_str(), day.as_str()))
            .context("Failed to get progress record")?;

        match value {
            Some(guard) => {
                let record: ProgressRecord = serde_json::from_slice(guard.value())
                    .context("Failed to deserialize progress record")?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    pub fn add_hours(&self, key: &ProgressKey, hours: Hours) -> Result<ProgressUpdate> {
        let day = key.day_label();
        let write_txn = self.db.begin_write().context("Failed to begin write")?;
        let update = {
            let mut table = write_txn
                .open_table(PROGRESS_TABLE)
                .context("Failed to open table")?;

            let existing: Option<ProgressRecord> = table
                .get((key.user_id.as_str(), key.topic.as_str(), day.as_str()))
                .context("Failed to get progress record")?
                .map(|guard| serde_json::from_slice(guard.value()))
                .transpose()
                .context("Failed to deserialize progress record")?;

            let update = match existing {
                Some(mut record) => {
                    let previous = record.hours;
                    record.hours = previous.checked_add(hours).ok_or_else(|| {
                        anyhow::anyhow!(
                            "Adding {} hours to {} exceeds the largest storable total",
                            hours,
                            previous
                        )
                    })?;
                    ProgressUpdate::Incremented { previous, record }
                }
                None => ProgressUpdate::Created(ProgressRecord::new(key, hours)),
            };

            let value = serde_json::to_vec(update.record())
                .context("Failed to serialize progress record")?;
            table
                .insert(
                    (key.user_id.as_str(), key.topic.as_str(), day.as_str()),
                    value.as_slice(),
                )
                .context("Failed to insert progress record")?;

            update
        };
        write_txn.commit().context("Failed to commit")?;

        Ok(update)
    }

    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<ProgressRecord>> {
        let read_txn = self.db.begin_read().context("Failed to begin read")?;
        let table = read_txn
            .open_table(PROGRESS_TABLE)
            .context("Failed to open table")?;

        let mut records = Vec::new();
        for item in table.iter().context("Failed to iterate progress records")? {
            let (key, value) = item.context("Failed to read item")?;
            if key.value().0 != user_id {
                continue;
            }
            let record: ProgressRecord = serde_json::from_slice(value.value())
                .context("Failed to deserialize progress record")?;
            records.push(record);
        }

        records.sort_by(|a, b| b.day.cmp(&a.day).then_with(|| a.topic.cmp(&b.topic)));

        Ok(records)
    }
}

impl ProgressStore for RedbProgressStore {
    fn get(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>> {
        RedbProgressStore::get(self, key)
    }

    fn add_hours(&self, key: &ProgressKey, hours: Hours) -> Result<ProgressUpdate> {
        RedbProgressStore::add_hours(self, key, hours)
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<ProgressRecord>> {
        RedbProgressStore::list_for_user(self, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_add_hours_creates_then_increments() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbProgressStore::new(temp_file.path().to_path_buf()).unwrap();
        let key = ProgressKey::new("u1", "algebra", day(1));

        assert!(store.get(&key).unwrap().is_none());

        let first = store.add_hours(&key, Hours::from_hundredths(150)).unwrap();
        let created = match first {
            ProgressUpdate::Created(record) => record,
            other => panic!("expected a new record, got {:?}", other),
        };
        assert_eq!(created.hours, Hours::from_hundredths(150));

        let second = store.add_hours(&key, Hours::from_hundredths(50)).unwrap();
        match second {
            ProgressUpdate::Incremented { previous, record } => {
                assert_eq!(previous, Hours::from_hundredths(150));
                assert_eq!(record.hours, Hours::from_hundredths(200));
                assert_eq!(record.id, created.id);
                assert_eq!(record.created_at, created.created_at);
            }
            other => panic!("expected an increment, got {:?}", other),
        }

        let stored = store.get(&key).unwrap().unwrap();
        assert_eq!(stored.hours, Hours::from_hundredths(200));
    }

    #[test]
    fn test_days_and_topics_are_separate_records() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbProgressStore::new(temp_file.path().to_path_buf()).unwrap();

        store
            .add_hours(&ProgressKey::new("u1", "algebra", day(1)), Hours::from_hundredths(100))
            .unwrap();
        store
            .add_hours(&ProgressKey::new("u1", "algebra", day(2)), Hours::from_hundredths(200))
            .unwrap();
        store
            .add_hours(&ProgressKey::new("u1", "biology", day(2)), Hours::from_hundredths(300))
            .unwrap();
        store
            .add_hours(&ProgressKey::new("u2", "algebra", day(2)), Hours::from_hundredths(400))
            .unwrap();

        let records = store.list_for_user("u1").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].day, day(2));
        assert_eq!(records[0].topic, "algebra");
        assert_eq!(records[1].topic, "biology");
        assert_eq!(records[2].day, day(1));

        assert_eq!(store.list_for_user("u2").unwrap().len(), 1);
        assert!(store.list_for_user("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbProgressStore::new(temp_file.path().to_path_buf()).unwrap();
        let key = ProgressKey::new("u1", "algebra", day(4));

        store.add_hours(&key, Hours::from_hundredths(u32::MAX - 10)).unwrap();
        let err = store.add_hours(&key, Hours::from_hundredths(11)).unwrap_err();
        assert!(err.to_string().contains("exceeds the largest storable total"));

        // The failed write transaction is dropped, leaving the record untouched
        let stored = store.get(&key).unwrap().unwrap();
        assert_eq!(stored.hours, Hours::from_hundredths(u32::MAX - 10));
    }

    #[test]
    fn test_concurrent_adds_do_not_lose_updates() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbProgressStore::new(temp_file.path().to_path_buf()).unwrap();
        let key = ProgressKey::new("u1", "algebra", day(3));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let key = key.clone();
                std::thread::spawn(move || {
                    store.add_hours(&key, Hours::from_hundredths(100)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = store.get(&key).unwrap().unwrap();
        assert_eq!(stored.hours, Hours::from_hundredths(800));
        assert_eq!(store.list_for_user("u1").unwrap().len(), 1);
    }
}
