//! In-memory aggregate store.

use super::AssessmentStore;
use crate::{AssessmentId, StoreError, WorkflowAggregate};
use std::collections::BTreeMap;

/// `BTreeMap`-backed store. Listing order is deterministic (by id).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    assessments: BTreeMap<AssessmentId, WorkflowAggregate>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assessments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }
}

impl AssessmentStore for MemoryStore {
    fn create(&mut self, aggregate: &WorkflowAggregate) -> Result<(), StoreError> {
        if self.assessments.contains_key(aggregate.id()) {
            return Err(StoreError::AlreadyExists(aggregate.id().clone()));
        }
        self.assessments
            .insert(aggregate.id().clone(), aggregate.clone());
        Ok(())
    }

    fn load(&self, id: &AssessmentId) -> Result<Option<WorkflowAggregate>, StoreError> {
        Ok(self.assessments.get(id).cloned())
    }

    fn save(&mut self, aggregate: &WorkflowAggregate) -> Result<(), StoreError> {
        self.assessments
            .insert(aggregate.id().clone(), aggregate.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<WorkflowAggregate>, StoreError> {
        Ok(self.assessments.values().cloned().collect())
    }
}
