//! # Notification Sink
//!
//! Optional observers of successful mutations. Notifiers are called only
//! after the aggregate has been saved and cannot fail the operation.

use crate::aggregate::{StageHistoryEntry, WorkflowAggregate};
use crate::ledger::ScoreEntry;

/// Fire-and-forget observer of workflow events.
pub trait Notifier: Send + Sync {
    /// A stage transition was saved.
    fn on_transition(&self, _aggregate: &WorkflowAggregate, _entry: &StageHistoryEntry) {}

    /// A score entry was saved.
    fn on_score(&self, _aggregate: &WorkflowAggregate, _entry: &ScoreEntry) {}

    /// A blocker was added or resolved.
    fn on_blockers_changed(&self, _aggregate: &WorkflowAggregate) {}
}

/// Notifier that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {}
