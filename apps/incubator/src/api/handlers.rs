//! # API Endpoint Handlers
//!
//! Reads take the shared read lock; every mutation takes the write lock
//! for its whole load-modify-save cycle, so writers are serialized on top
//! of the aggregate's version check.
//!
//! Mutations hand the caller's optional identity straight to the engine,
//! which checks version and payload before the role. An unauthenticated
//! caller therefore sees exactly what a wrong-role caller sees.

use super::{
    AppState,
    error::ApiError,
    identity::Caller,
    types::{
        AssessmentListResponse, AssessmentResponse, AssessmentSummary, BlockerBody,
        HealthResponse, MutationResponse, OpenAssessmentRequest, ScoreRequest, SnapshotResponse,
        StagesResponse, TransitionBody,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use incubator_core::{
    AssessmentId, AuthorizationGate, ScoreEntry, StageCatalog, StageHistoryEntry,
    formats::snapshot_digest,
};

// =============================================================================
// HEALTH & CATALOG
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Stage catalog with required roles.
pub async fn stages_handler() -> impl IntoResponse {
    Json(StagesResponse::catalog())
}

// =============================================================================
// ASSESSMENT READS
// =============================================================================

/// List every assessment. Any recognized role may view every stage.
pub async fn list_handler(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<AssessmentListResponse>, ApiError> {
    caller.require_view(StageCatalog::initial())?;
    let pipeline = state.pipeline.read().await;

    let assessments: Vec<AssessmentSummary> = pipeline
        .list()?
        .iter()
        .map(AssessmentSummary::from)
        .collect();

    Ok(Json(AssessmentListResponse {
        count: assessments.len(),
        assessments,
    }))
}

/// One assessment with history, scores and score summary.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Caller,
) -> Result<Json<AssessmentResponse>, ApiError> {
    let pipeline = state.pipeline.read().await;
    let aggregate = pipeline.get(&AssessmentId::new(id))?;
    caller.require_view(aggregate.current_stage())?;
    Ok(Json(AssessmentResponse::new(&aggregate, &caller)))
}

// =============================================================================
// ASSESSMENT MUTATIONS
// =============================================================================

/// Open a new assessment at the initial stage.
///
/// The caller must be allowed to act on the initial stage.
pub async fn open_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<OpenAssessmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    AuthorizationGate::authorize(caller.role(), StageCatalog::initial())?;

    let mut pipeline = state.pipeline.write().await;
    let aggregate = pipeline.open(request.assessment_id(), &request.startup_name)?;

    tracing::info!(
        event = "assessment_opened",
        assessment = %aggregate.id(),
        startup = aggregate.startup_name(),
        "Assessment opened"
    );

    Ok((
        StatusCode::CREATED,
        Json(AssessmentResponse::new(&aggregate, &caller)),
    ))
}

/// Append a score to the assessment's ledger.
pub async fn score_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Caller,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<MutationResponse<ScoreEntry>>, ApiError> {
    let id = AssessmentId::new(id);
    let mut pipeline = state.pipeline.write().await;
    let outcome = pipeline.add_score(
        &id,
        &request.candidate,
        caller.actor(),
        request.expected_version()?,
    )?;

    Ok(Json(MutationResponse {
        assessment: AssessmentResponse::new(&outcome.aggregate, &caller),
        record: outcome.record,
    }))
}

/// Move the assessment one stage forward or backward.
pub async fn transition_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Caller,
    Json(body): Json<TransitionBody>,
) -> Result<Json<MutationResponse<StageHistoryEntry>>, ApiError> {
    let id = AssessmentId::new(id);
    let mut pipeline = state.pipeline.write().await;
    let request = body.to_request()?;
    let outcome = pipeline.request_transition(&id, &request, caller.actor())?;

    Ok(Json(MutationResponse {
        assessment: AssessmentResponse::new(&outcome.aggregate, &caller),
        record: outcome.record,
    }))
}

/// Record a blocker.
pub async fn add_blocker_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Caller,
    Json(body): Json<BlockerBody>,
) -> Result<Json<MutationResponse<String>>, ApiError> {
    let id = AssessmentId::new(id);
    let mut pipeline = state.pipeline.write().await;
    let outcome =
        pipeline.add_blocker(&id, body.reason(), caller.actor(), body.expected_version()?)?;

    Ok(Json(MutationResponse {
        assessment: AssessmentResponse::new(&outcome.aggregate, &caller),
        record: outcome.record,
    }))
}

/// Resolve a blocker by its exact reason.
pub async fn resolve_blocker_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Caller,
    Json(body): Json<BlockerBody>,
) -> Result<Json<MutationResponse<String>>, ApiError> {
    let id = AssessmentId::new(id);
    let mut pipeline = state.pipeline.write().await;
    let outcome =
        pipeline.resolve_blocker(&id, body.reason(), caller.actor(), body.expected_version()?)?;

    Ok(Json(MutationResponse {
        assessment: AssessmentResponse::new(&outcome.aggregate, &caller),
        record: outcome.record,
    }))
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Export every assessment as a base64 snapshot with its BLAKE3 digest.
pub async fn snapshot_handler(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<SnapshotResponse>, ApiError> {
    caller.require_view(StageCatalog::initial())?;
    let pipeline = state.pipeline.read().await;

    let count = pipeline.list()?.len();
    let bytes = pipeline.export_snapshot()?;

    Ok(Json(SnapshotResponse {
        count,
        digest: snapshot_digest(&bytes),
        data: base64::engine::general_purpose::STANDARD.encode(&bytes),
    }))
}
