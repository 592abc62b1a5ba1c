//! # Storage Module
//!
//! Persistence boundary for workflow aggregates.
//!
//! The engine is oblivious to storage technology. A store only has to
//! round-trip every field of an aggregate, preserving the order of
//! `scores` and `stage_history` exactly.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::{AssessmentId, StoreError, WorkflowAggregate};
use std::path::Path;

/// Load/save contract for aggregates.
pub trait AssessmentStore: Send + Sync {
    /// Insert a new aggregate. Fails with [`StoreError::AlreadyExists`] if the id is taken.
    fn create(&mut self, aggregate: &WorkflowAggregate) -> Result<(), StoreError>;

    /// Load an aggregate by id.
    fn load(&self, id: &AssessmentId) -> Result<Option<WorkflowAggregate>, StoreError>;

    /// Durably store an aggregate, replacing any previous copy.
    fn save(&mut self, aggregate: &WorkflowAggregate) -> Result<(), StoreError>;

    /// All aggregates, ordered by id.
    fn list(&self) -> Result<Vec<WorkflowAggregate>, StoreError>;

    /// Store a batch of aggregates, replacing previous copies.
    ///
    /// Stores that can write the batch in one transaction override this so a
    /// failure leaves none of it applied.
    fn save_all(&mut self, aggregates: &[WorkflowAggregate]) -> Result<(), StoreError> {
        aggregates.iter().try_for_each(|aggregate| self.save(aggregate))
    }
}

/// Runtime-selected storage backend.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory map (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    /// Open or create a redb-backed store at `path`.
    pub fn redb(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        RedbStore::open(path).map(Self::Persistent)
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }
}

impl AssessmentStore for StorageBackend {
    fn create(&mut self, aggregate: &WorkflowAggregate) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.create(aggregate),
            Self::Persistent(store) => store.create(aggregate),
        }
    }

    fn load(&self, id: &AssessmentId) -> Result<Option<WorkflowAggregate>, StoreError> {
        match self {
            Self::InMemory(store) => store.load(id),
            Self::Persistent(store) => store.load(id),
        }
    }

    fn save(&mut self, aggregate: &WorkflowAggregate) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.save(aggregate),
            Self::Persistent(store) => store.save(aggregate),
        }
    }

    fn list(&self) -> Result<Vec<WorkflowAggregate>, StoreError> {
        match self {
            Self::InMemory(store) => store.list(),
            Self::Persistent(store) => store.list(),
        }
    }

    fn save_all(&mut self, aggregates: &[WorkflowAggregate]) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.save_all(aggregates),
            Self::Persistent(store) => store.save_all(aggregates),
        }
    }
}
