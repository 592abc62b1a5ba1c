//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::AppError;
use crate::api::{
    self, AppPipeline, AppState, AssessmentResponse, AssessmentSummary, Caller, StagesResponse,
};
use crate::config::{BackendKind, ServerConfig, StorageSettings};
use crate::notify::TracingNotifier;
use incubator_core::{
    Actor, AssessmentId, Direction, Pipeline, ScoreCandidate, StageCatalog, TransitionRequest,
    WorkflowAggregate,
    formats::{snapshot::MAX_SNAPSHOT_SIZE, snapshot_digest},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE HELPERS
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AppError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AppError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AppError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| {
        AppError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AppError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require it to be a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, AppError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        AppError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(AppError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| AppError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Open the pipeline over the selected store.
pub fn open_pipeline(storage: &StorageSettings) -> Result<AppPipeline, AppError> {
    if storage.backend == BackendKind::Memory {
        tracing::warn!("Memory backend selected: changes are discarded on exit");
    }
    Ok(Pipeline::new(storage.open()?, TracingNotifier))
}

/// The given version, or the assessment's current one.
fn resolve_version(
    pipeline: &AppPipeline,
    id: &AssessmentId,
    expected_version: Option<u64>,
) -> Result<u64, AppError> {
    match expected_version {
        Some(version) => Ok(version),
        None => Ok(pipeline.get(id)?.version()),
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

fn print_assessment(aggregate: &WorkflowAggregate) {
    println!("{} ({})", aggregate.startup_name(), aggregate.id());
    println!("==================");
    println!(
        "Stage:     {} [{}]",
        aggregate.stage_label(),
        aggregate.current_stage()
    );
    println!("Progress:  {}%", aggregate.progress_percent());
    println!("Version:   {}", aggregate.version());

    if aggregate.blockers().is_empty() {
        println!("Blockers:  none");
    } else {
        println!("Blockers:");
        for blocker in aggregate.blockers() {
            println!("  - {}", blocker);
        }
    }

    let summary = aggregate.score_summary();
    match summary.average_percent {
        Some(avg) => println!("Scores:    {} (average {}%)", summary.count, avg),
        None => println!("Scores:    none"),
    }
    for score in aggregate.scores() {
        println!(
            "  {:<24} {:>3}/{:<3} by {} ({}): {}",
            score.category,
            score.score,
            score.max_score,
            score.reviewer_name,
            score.reviewed_at.format("%Y-%m-%d"),
            score.comments
        );
    }

    if !aggregate.stage_history().is_empty() {
        println!("History:");
        for entry in aggregate.stage_history() {
            println!(
                "  {} {:<17} {:<8} by {}: {}",
                entry.completed_at.format("%Y-%m-%d %H:%M"),
                entry.stage,
                entry.direction,
                entry.completed_by,
                entry.notes
            );
        }
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(storage: &StorageSettings, server: ServerConfig) -> Result<(), AppError> {
    let store = storage.open()?;

    println!("Incubator Assessment Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", server.host);
    println!("  Port:     {}", server.port);
    println!("  Backend:  {}", storage.backend.as_str());
    println!("  Database: {:?}", storage.database);
    println!();
    println!("Endpoints:");
    println!("  GET  /stages                             - Stage catalog");
    println!("  GET  /assessments                        - List assessments");
    println!("  POST /assessments                        - Open an assessment");
    println!("  GET  /assessments/{{id}}                   - Assessment detail");
    println!("  POST /assessments/{{id}}/scores            - Add a score");
    println!("  POST /assessments/{{id}}/transitions       - Advance or retreat");
    println!("  POST /assessments/{{id}}/blockers          - Add a blocker");
    println!("  POST /assessments/{{id}}/blockers/resolve  - Resolve a blocker");
    println!("  GET  /snapshot                           - Export snapshot");
    println!("  GET  /health                             - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(AppState::with_config(store, server)).await
}

// =============================================================================
// INIT & CATALOG
// =============================================================================

/// Create an empty database.
pub fn cmd_init(storage: &StorageSettings, force: bool, json_mode: bool) -> Result<(), AppError> {
    if storage.backend != BackendKind::Redb {
        return Err(AppError::Config(
            "init requires the redb backend".to_string(),
        ));
    }

    if storage.database.exists() {
        if !force {
            return Err(AppError::Config(format!(
                "Database {:?} already exists (use --force to replace it)",
                storage.database
            )));
        }
        std::fs::remove_file(&storage.database)
            .map_err(|e| AppError::Io(format!("Cannot remove old database: {}", e)))?;
    }

    storage.open()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": storage.database.to_string_lossy(),
            "initialized": true
        }));
    } else {
        println!("Initialized empty database at {:?}", storage.database);
    }
    Ok(())
}

/// Show the stage catalog.
pub fn cmd_stages(json_mode: bool) -> Result<(), AppError> {
    if json_mode {
        print_json(&StagesResponse::catalog());
        return Ok(());
    }

    println!("Assessment Stages");
    println!("=================");
    for descriptor in StageCatalog::stages() {
        let roles: Vec<&str> = descriptor.required_roles.iter().map(|r| r.as_str()).collect();
        println!(
            "{}. {:<18} {:>3}%  [{}]",
            descriptor.key.index(),
            descriptor.label,
            StageCatalog::progress_for(descriptor.key),
            roles.join(", ")
        );
        println!("   {}", descriptor.description);
    }
    Ok(())
}

// =============================================================================
// ASSESSMENT COMMANDS
// =============================================================================

/// Open a new assessment.
pub fn cmd_open(
    storage: &StorageSettings,
    json_mode: bool,
    id: &str,
    startup_name: &str,
) -> Result<(), AppError> {
    let mut pipeline = open_pipeline(storage)?;
    let aggregate = pipeline.open(AssessmentId::new(id), startup_name)?;

    if json_mode {
        print_json(&AssessmentResponse::new(&aggregate, &Caller::default()));
    } else {
        println!(
            "Opened {} ({}) at {}",
            aggregate.startup_name(),
            aggregate.id(),
            aggregate.stage_label()
        );
    }
    Ok(())
}

/// List assessments.
pub fn cmd_list(storage: &StorageSettings, json_mode: bool) -> Result<(), AppError> {
    let pipeline = open_pipeline(storage)?;
    let aggregates = pipeline.list()?;

    if json_mode {
        let rows: Vec<AssessmentSummary> =
            aggregates.iter().map(AssessmentSummary::from).collect();
        print_json(&rows);
        return Ok(());
    }

    if aggregates.is_empty() {
        println!("No assessments.");
        return Ok(());
    }
    for aggregate in &aggregates {
        let flag = if aggregate.can_proceed() { "" } else { "  [blocked]" };
        println!(
            "{:<16} {:<28} {:<18} {:>3}%{}",
            aggregate.id(),
            aggregate.startup_name(),
            aggregate.stage_label(),
            aggregate.progress_percent(),
            flag
        );
    }
    Ok(())
}

/// Show one assessment.
pub fn cmd_show(storage: &StorageSettings, json_mode: bool, id: &str) -> Result<(), AppError> {
    let pipeline = open_pipeline(storage)?;
    let aggregate = pipeline.get(&AssessmentId::new(id))?;

    if json_mode {
        print_json(&AssessmentResponse::new(&aggregate, &Caller::default()));
    } else {
        print_assessment(&aggregate);
    }
    Ok(())
}

/// Append a score.
pub fn cmd_score(
    storage: &StorageSettings,
    json_mode: bool,
    id: &str,
    candidate: &ScoreCandidate,
    expected_version: Option<u64>,
    reviewer: &Actor,
) -> Result<(), AppError> {
    let mut pipeline = open_pipeline(storage)?;
    let id = AssessmentId::new(id);
    let version = resolve_version(&pipeline, &id, expected_version)?;

    let outcome = pipeline.add_score(&id, candidate, reviewer, version)?;

    if json_mode {
        print_json(&outcome.record);
    } else {
        println!(
            "Recorded {} {}/{} for {} (version {})",
            outcome.record.category,
            outcome.record.score,
            outcome.record.max_score,
            outcome.aggregate.id(),
            outcome.aggregate.version()
        );
    }
    Ok(())
}

/// Move an assessment one stage.
pub fn cmd_transition(
    storage: &StorageSettings,
    json_mode: bool,
    id: &str,
    direction: Direction,
    notes: String,
    expected_version: Option<u64>,
    actor: &Actor,
) -> Result<(), AppError> {
    let mut pipeline = open_pipeline(storage)?;
    let id = AssessmentId::new(id);
    let version = resolve_version(&pipeline, &id, expected_version)?;

    let request = TransitionRequest {
        direction,
        notes,
        expected_version: version,
    };
    let outcome = pipeline.request_transition(&id, &request, actor)?;

    if json_mode {
        print_json(&AssessmentResponse::new(
            &outcome.aggregate,
            &Caller::acting(actor.clone()),
        ));
    } else {
        println!(
            "{}: {} -> {} ({}%)",
            outcome.aggregate.id(),
            outcome.record.stage,
            outcome.aggregate.current_stage(),
            outcome.aggregate.progress_percent()
        );
    }
    Ok(())
}

/// Blocker operation selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockerAction {
    Add,
    Resolve,
}

/// Add or resolve a blocker.
pub fn cmd_blocker(
    storage: &StorageSettings,
    json_mode: bool,
    id: &str,
    action: BlockerAction,
    reason: &str,
    expected_version: Option<u64>,
    actor: &Actor,
) -> Result<(), AppError> {
    let mut pipeline = open_pipeline(storage)?;
    let id = AssessmentId::new(id);
    let version = resolve_version(&pipeline, &id, expected_version)?;

    let outcome = match action {
        BlockerAction::Add => pipeline.add_blocker(&id, reason, actor, version)?,
        BlockerAction::Resolve => pipeline.resolve_blocker(&id, reason, actor, version)?,
    };

    if json_mode {
        print_json(&serde_json::json!({
            "id": outcome.aggregate.id().as_str(),
            "reason": outcome.record,
            "blockers": outcome.aggregate.blockers(),
            "can_proceed": outcome.aggregate.can_proceed(),
            "version": outcome.aggregate.version()
        }));
    } else {
        let verb = match action {
            BlockerAction::Add => "Added",
            BlockerAction::Resolve => "Resolved",
        };
        println!(
            "{} blocker \"{}\" on {} ({} open)",
            verb,
            outcome.record,
            outcome.aggregate.id(),
            outcome.aggregate.blockers().len()
        );
    }
    Ok(())
}

// =============================================================================
// SNAPSHOT COMMANDS
// =============================================================================

/// Export every assessment to a snapshot file.
pub fn cmd_export(
    storage: &StorageSettings,
    json_mode: bool,
    output: &Path,
) -> Result<(), AppError> {
    let pipeline = open_pipeline(storage)?;
    let target = validate_output_path(output)?;

    let count = pipeline.list()?.len();
    let bytes = pipeline.export_snapshot()?;
    std::fs::write(&target, &bytes)
        .map_err(|e| AppError::Io(format!("Write failed: {}", e)))?;

    let digest = snapshot_digest(&bytes);
    if json_mode {
        print_json(&serde_json::json!({
            "output": target.to_string_lossy(),
            "count": count,
            "bytes": bytes.len(),
            "digest": digest
        }));
    } else {
        println!("Exported {} assessments to {:?}", count, target);
        println!("BLAKE3: {}", digest);
    }
    Ok(())
}

/// Import assessments from a snapshot file, replacing same-id entries.
pub fn cmd_import(
    storage: &StorageSettings,
    json_mode: bool,
    input: &Path,
) -> Result<(), AppError> {
    let source = validate_file_path(input)?;
    validate_file_size(&source, MAX_SNAPSHOT_SIZE as u64)?;
    let bytes =
        std::fs::read(&source).map_err(|e| AppError::Io(format!("Read failed: {}", e)))?;

    let mut pipeline = open_pipeline(storage)?;
    let count = pipeline.import_snapshot(&bytes)?;

    if json_mode {
        print_json(&serde_json::json!({
            "input": source.to_string_lossy(),
            "count": count,
            "digest": snapshot_digest(&bytes)
        }));
    } else {
        println!("Imported {} assessments from {:?}", count, source);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use incubator_core::{
        AssessmentStore, PipelineError, RedbStore, Role, StageKey, WorkflowError,
    };

    fn redb_settings(dir: &tempfile::TempDir, name: &str) -> StorageSettings {
        StorageSettings {
            database: dir.path().join(name),
            backend: BackendKind::Redb,
        }
    }

    fn editor() -> Actor {
        Actor::new("u-2", "Eli Editor", Role::Editor)
    }

    #[test]
    fn commands_persist_between_invocations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = redb_settings(&dir, "portal.db");

        cmd_init(&storage, false, true).expect("init");
        cmd_open(&storage, true, "acme", "Acme Robotics").expect("open");
        cmd_transition(
            &storage,
            true,
            "acme",
            Direction::Forward,
            "Eligible".to_string(),
            None,
            &editor(),
        )
        .expect("advance");
        cmd_blocker(
            &storage,
            true,
            "acme",
            BlockerAction::Add,
            "Missing financial model",
            None,
            &editor(),
        )
        .expect("blocker");

        let store = RedbStore::open(&storage.database).expect("reopen");
        let aggregate = store
            .load(&AssessmentId::new("acme"))
            .expect("load")
            .expect("present");
        assert_eq!(aggregate.current_stage(), StageKey::TechnicalReview);
        assert_eq!(aggregate.blockers(), ["Missing financial model".to_string()]);
        assert_eq!(aggregate.version(), 2);
    }

    #[test]
    fn init_refuses_existing_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = redb_settings(&dir, "portal.db");

        cmd_init(&storage, false, true).expect("first init");
        assert!(matches!(
            cmd_init(&storage, false, true),
            Err(AppError::Config(_))
        ));
        cmd_init(&storage, true, true).expect("forced init");
    }

    #[test]
    fn stale_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = redb_settings(&dir, "portal.db");
        cmd_open(&storage, true, "acme", "Acme Robotics").expect("open");

        let err = cmd_transition(
            &storage,
            true,
            "acme",
            Direction::Forward,
            "Eligible".to_string(),
            Some(5),
            &editor(),
        )
        .expect_err("stale");
        assert!(matches!(
            err,
            AppError::Pipeline(PipelineError::Workflow(WorkflowError::Conflict {
                expected: 5,
                actual: 0
            }))
        ));
    }

    #[test]
    fn export_then_import_into_fresh_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = redb_settings(&dir, "source.db");
        let target = redb_settings(&dir, "target.db");
        let snapshot = dir.path().join("portal.incb");

        cmd_open(&source, true, "acme", "Acme Robotics").expect("open");
        cmd_score(
            &source,
            true,
            "acme",
            &ScoreCandidate::new("Team", 80, "Experienced founders"),
            None,
            &editor(),
        )
        .expect("score");
        cmd_export(&source, true, &snapshot).expect("export");
        cmd_import(&target, true, &snapshot).expect("import");

        let id = AssessmentId::new("acme");
        let original = RedbStore::open(&source.database)
            .expect("source")
            .load(&id)
            .expect("load");
        let copied = RedbStore::open(&target.database)
            .expect("target")
            .load(&id)
            .expect("load");
        assert!(copied.is_some());
        assert_eq!(original, copied);
    }
}
