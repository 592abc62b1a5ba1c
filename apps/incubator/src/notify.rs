//! # Tracing Notifier
//!
//! Emits saved workflow events as structured `tracing` records.

use incubator_core::{Notifier, ScoreEntry, StageHistoryEntry, WorkflowAggregate};

/// Notifier that logs every saved event at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn on_transition(&self, aggregate: &WorkflowAggregate, entry: &StageHistoryEntry) {
        tracing::info!(
            event = "stage_transition",
            assessment = %aggregate.id(),
            from = %entry.stage,
            to = %aggregate.current_stage(),
            direction = %entry.direction,
            actor = %entry.completed_by,
            version = aggregate.version(),
            "Stage transition saved"
        );
    }

    fn on_score(&self, aggregate: &WorkflowAggregate, entry: &ScoreEntry) {
        tracing::info!(
            event = "score_added",
            assessment = %aggregate.id(),
            stage = %aggregate.current_stage(),
            category = %entry.category,
            score = entry.score,
            max_score = entry.max_score,
            reviewer = %entry.reviewer_id,
            version = aggregate.version(),
            "Score saved"
        );
    }

    fn on_blockers_changed(&self, aggregate: &WorkflowAggregate) {
        tracing::info!(
            event = "blockers_changed",
            assessment = %aggregate.id(),
            blockers = aggregate.blockers().len(),
            can_proceed = aggregate.can_proceed(),
            version = aggregate.version(),
            "Blockers updated"
        );
    }
}
