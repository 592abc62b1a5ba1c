//! # Incubator HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /stages` - Stage catalog with required roles
//! - `GET /assessments` - List assessments
//! - `POST /assessments` - Open a new assessment
//! - `GET /assessments/{id}` - Assessment detail
//! - `POST /assessments/{id}/scores` - Append a score
//! - `POST /assessments/{id}/transitions` - Move one stage forward or back
//! - `POST /assessments/{id}/blockers` - Record a blocker
//! - `POST /assessments/{id}/blockers/resolve` - Resolve a blocker
//! - `GET /snapshot` - Base64 snapshot of all assessments
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `INCUBATOR_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `INCUBATOR_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `INCUBATOR_API_KEY`: If set, requires Bearer token authentication
//!
//! Environment variables override the `[server]` section of the config file.

mod auth;
mod error;
mod handlers;
mod identity;
mod middleware;
mod types;

pub use auth::ServiceKey;
pub use error::ApiError;
pub use identity::{ACTOR_ID_HEADER, ACTOR_NAME_HEADER, ACTOR_ROLE_HEADER, Caller};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    AssessmentListResponse, AssessmentResponse, AssessmentSummary, BlockerBody, ErrorResponse,
    HealthResponse, MutationResponse, OpenAssessmentRequest, ScoreRequest, SnapshotResponse,
    StageResponse, StagesResponse, TransitionBody,
};

use crate::AppError;
use crate::config::ServerConfig;
use crate::notify::TracingNotifier;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use incubator_core::{Pipeline, StorageBackend};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Pipeline type served by the app.
pub type AppPipeline = Pipeline<StorageBackend, TracingNotifier>;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The workflow pipeline over the configured store.
    pub pipeline: Arc<RwLock<AppPipeline>>,
    /// Server settings from the config file.
    pub server: Arc<ServerConfig>,
}

impl AppState {
    /// State with default server settings.
    #[must_use]
    pub fn new(store: StorageBackend) -> Self {
        Self::with_config(store, ServerConfig::default())
    }

    #[must_use]
    pub fn with_config(store: StorageBackend, server: ServerConfig) -> Self {
        Self {
            pipeline: Arc::new(RwLock::new(Pipeline::new(store, TracingNotifier))),
            server: Arc::new(server),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

fn allowed_headers() -> [HeaderName; 5] {
    [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static(ACTOR_ID_HEADER),
        HeaderName::from_static(ACTOR_NAME_HEADER),
        HeaderName::from_static(ACTOR_ROLE_HEADER),
    ]
}

/// Build the CORS layer.
///
/// `INCUBATOR_CORS_ORIGINS` wins over the configured value:
/// - "*": allows all origins (development only)
/// - unset: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer(configured: Option<&str>) -> CorsLayer {
    let origins_env = std::env::var("INCUBATOR_CORS_ORIGINS").ok();

    match origins_env.as_deref().or(configured) {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers(allowed_headers())
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|s| s.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allowed_headers())
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting - if enabled
/// 5. Authentication - if an API key is configured
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.server.cors_origins.as_deref());

    let rate_limit = get_rate_limit_from_env(state.server.rate_limit);
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let service_key = ServiceKey::from_env();
    if service_key.is_some() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - identity headers are trusted from any client. \
             Set INCUBATOR_API_KEY to require a service key."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/stages", get(handlers::stages_handler))
        .route(
            "/assessments",
            get(handlers::list_handler).post(handlers::open_handler),
        )
        .route("/assessments/{id}", get(handlers::get_handler))
        .route("/assessments/{id}/scores", post(handlers::score_handler))
        .route(
            "/assessments/{id}/transitions",
            post(handlers::transition_handler),
        )
        .route(
            "/assessments/{id}/blockers",
            post(handlers::add_blocker_handler),
        )
        .route(
            "/assessments/{id}/blockers/resolve",
            post(handlers::resolve_blocker_handler),
        )
        .route("/snapshot", get(handlers::snapshot_handler));

    if let Some(key) = service_key {
        router = router.layer(axum_middleware::from_fn_with_state(
            key,
            auth::require_service_key,
        ));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(state: AppState) -> Result<(), AppError> {
    let addr = state.server.bind_addr();
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Incubator HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}
