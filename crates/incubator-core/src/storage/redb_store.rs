//! # redb-backed Aggregate Store
//!
//! A disk-backed store using the redb embedded database, providing:
//! - ACID transactions (each save, and each batch save, is one write transaction)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Aggregates are stored as postcard bytes keyed by assessment id and are
//! checked with [`WorkflowAggregate::verify`] on the way out.

use super::AssessmentStore;
use crate::{AssessmentId, StoreError, WorkflowAggregate};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for assessments: id -> postcard-serialized WorkflowAggregate.
const ASSESSMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("assessments");

fn io_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Io(e.to_string())
}

/// A disk-backed aggregate store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(ASSESSMENTS).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), StoreError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }

    fn encode(aggregate: &WorkflowAggregate) -> Result<Vec<u8>, StoreError> {
        postcard::to_allocvec(aggregate).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<WorkflowAggregate, StoreError> {
        let aggregate: WorkflowAggregate = postcard::from_bytes(bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        aggregate.verify().map_err(StoreError::Serialization)?;
        Ok(aggregate)
    }

    fn write(&self, aggregate: &WorkflowAggregate, must_be_new: bool) -> Result<(), StoreError> {
        let bytes = Self::encode(aggregate)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(ASSESSMENTS).map_err(io_err)?;
            let key = aggregate.id().as_str();
            if must_be_new && table.get(key).map_err(io_err)?.is_some() {
                return Err(StoreError::AlreadyExists(aggregate.id().clone()));
            }
            table.insert(key, bytes.as_slice()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }
}

impl AssessmentStore for RedbStore {
    fn create(&mut self, aggregate: &WorkflowAggregate) -> Result<(), StoreError> {
        self.write(aggregate, true)
    }

    fn load(&self, id: &AssessmentId) -> Result<Option<WorkflowAggregate>, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(ASSESSMENTS).map_err(io_err)?;
        match table.get(id.as_str()).map_err(io_err)? {
            Some(guard) => Self::decode(guard.value()).map(Some),
            None => Ok(None),
        }
    }

    fn save(&mut self, aggregate: &WorkflowAggregate) -> Result<(), StoreError> {
        self.write(aggregate, false)
    }

    fn save_all(&mut self, aggregates: &[WorkflowAggregate]) -> Result<(), StoreError> {
        let encoded = aggregates
            .iter()
            .map(|aggregate| Self::encode(aggregate).map(|bytes| (aggregate.id().as_str(), bytes)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(ASSESSMENTS).map_err(io_err)?;
            for (key, bytes) in &encoded {
                table.insert(*key, bytes.as_slice()).map_err(io_err)?;
            }
        }
        write_txn.commit().map_err(io_err)
    }

    fn list(&self) -> Result<Vec<WorkflowAggregate>, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(ASSESSMENTS).map_err(io_err)?;
        let mut result = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            result.push(Self::decode(value.value())?);
        }
        Ok(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ScoreCandidate, ScoringLedger};
    use crate::{Actor, Role, TransitionEngine, TransitionRequest};
    use chrono::TimeZone;

    #[test]
    fn save_and_reopen_preserves_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("assessments.redb");
        let admin = Actor::new("u-1", "Ari Admin", Role::Admin);
        let now = chrono::Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp");

        let mut aggregate = WorkflowAggregate::new(AssessmentId::new("a-1"), "Acme");
        for (category, score) in [("Team", 80), ("Market", 60)] {
            let version = aggregate.version();
            ScoringLedger::add_score(
                &mut aggregate,
                &ScoreCandidate::new(category, score, "noted"),
                &admin,
                version,
                now,
            )
            .expect("score");
        }
        let request = TransitionRequest::forward("Eligible", aggregate.version());
        TransitionEngine::request_transition(&mut aggregate, &request, &admin, now)
            .expect("transition");

        {
            let mut store = RedbStore::open(&path).expect("open");
            store.create(&aggregate).expect("create");
        }

        let store = RedbStore::open(&path).expect("reopen");
        let loaded = store
            .load(&AssessmentId::new("a-1"))
            .expect("load")
            .expect("present");
        assert_eq!(loaded, aggregate);
        assert_eq!(loaded.scores()[0].category, "Team");
        assert_eq!(loaded.scores()[1].category, "Market");
    }

    #[test]
    fn create_twice_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = RedbStore::open(dir.path().join("db.redb")).expect("open");
        let aggregate = WorkflowAggregate::new(AssessmentId::new("a-1"), "Acme");
        store.create(&aggregate).expect("create");
        assert!(matches!(
            store.create(&aggregate),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(store.load(&AssessmentId::new("missing")).expect("load").is_none());
    }

    #[test]
    fn save_all_writes_batch_in_one_transaction() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db.redb");
        let batch = vec![
            WorkflowAggregate::new(AssessmentId::new("a-1"), "Acme"),
            WorkflowAggregate::new(AssessmentId::new("a-2"), "Globex"),
        ];

        {
            let mut store = RedbStore::open(&path).expect("open");
            store
                .create(&WorkflowAggregate::new(AssessmentId::new("a-1"), "Old Name"))
                .expect("create");
            store.save_all(&batch).expect("save_all");
        }

        let store = RedbStore::open(&path).expect("reopen");
        assert_eq!(store.list().expect("list"), batch);
    }
}
