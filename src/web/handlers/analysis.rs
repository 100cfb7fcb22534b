//! # Analysis Handlers
//!
//! Forced re-analysis of one row and the backlog sweep.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::FeedbackRecord;
use crate::orchestration::{FeedbackWorkflowParams, SweepReport};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ProcessPendingResponse {
    /// Rows a dispatch was attempted for
    pub processed: usize,
    #[serde(flatten)]
    pub report: SweepReport,
}

/// Re-analyze one row inline, ignoring its processed flag: POST /api/analyze
pub async fn analyze_feedback(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<FeedbackRecord>> {
    if request.id <= 0 {
        return Err(ApiError::bad_request("id must be a positive integer"));
    }

    state
        .workflow
        .run_inline(FeedbackWorkflowParams::new(request.id), true)
        .await?;

    let record = state
        .store
        .find_by_id(request.id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Feedback {} not found", request.id)))?;
    Ok(Json(record))
}

/// Dispatch every unprocessed row: POST /api/process-pending
pub async fn process_pending(
    State(state): State<AppState>,
) -> ApiResult<Json<ProcessPendingResponse>> {
    let report = state.sweep.run().await?;
    info!(attempted = report.attempted, "Backlog sweep requested via API");

    Ok(Json(ProcessPendingResponse {
        processed: report.attempted,
        report,
    }))
}
