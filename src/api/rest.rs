// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// JSON surface for a charting front-end. All endpoints live under `/api/v1/`.
//
// Status mapping for /analysis:
//   Ready                 200
//   NotFound              404  (unknown ticker / no history)
//   InvalidConfiguration  400
//   RetrievalFailure      503  (transient, caller may retry)
//
// CORS is permissive; the API serves read-only market analysis.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{AnalysisEngine, AnalysisRequest, Snapshot};
use crate::error::EngineError;
use crate::types::Period;

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST API router with CORS middleware and shared engine.
pub fn router(engine: Arc<AnalysisEngine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/periods", get(periods))
        .route("/api/v1/analysis", get(analysis))
        .route("/api/v1/cache/clear", post(clear_cache))
        .layer(cors)
        .with_state(engine)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    cached_series: usize,
    server_time: i64,
}

async fn health(State(engine): State<Arc<AnalysisEngine>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        cached_series: engine.store().cache().len(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Periods
// =============================================================================

async fn periods() -> impl IntoResponse {
    let names: Vec<&'static str> = Period::ALL.iter().map(Period::as_str).collect();
    Json(names)
}

// =============================================================================
// Analysis
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnalysisQuery {
    symbol: String,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    narrate: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    retryable: bool,
}

async fn analysis(
    State(engine): State<Arc<AnalysisEngine>>,
    query: Result<Query<AnalysisQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            return error_response(EngineError::InvalidConfiguration(rejection.body_text()))
        }
    };
    let period = query.period.as_deref().unwrap_or(Period::default().as_str());

    let request = match AnalysisRequest::parse(&query.symbol, period, query.narrate) {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };

    match engine.analyze(&request).await {
        Ok(snapshot @ Snapshot::NotFound { .. }) => {
            info!(symbol = %request.symbol, period = %request.period, "analysis: not found");
            (StatusCode::NOT_FOUND, Json(snapshot)).into_response()
        }
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(err: EngineError) -> Response {
    let status = match &err {
        EngineError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
        EngineError::Retrieval(_) => {
            warn!(error = %err, "analysis retrieval failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    let body = ErrorResponse {
        retryable: err.is_retryable(),
        error: err.to_string(),
    };
    (status, Json(body)).into_response()
}

// =============================================================================
// Cache control
// =============================================================================

async fn clear_cache(State(engine): State<Arc<AnalysisEngine>>) -> impl IntoResponse {
    let cache = engine.store().cache();
    let dropped = cache.len();
    cache.clear();
    info!(dropped, "series cache cleared via API");
    Json(serde_json::json!({ "cleared": dropped }))
}
