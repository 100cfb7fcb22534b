//! # Health Check Handlers

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub live_instances: usize,
    pub timestamp: String,
}

/// Store connectivity probe: GET /health
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    if let Err(err) = state.store.health_check().await {
        error!(error = %err, "Health check failed");
        return Err(ApiError::from(err));
    }

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        store: "ok".to_string(),
        live_instances: state.workflow.registry().live_count(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
