//! # Feedback Handlers
//!
//! Creating, listing and fetching feedback rows.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{FeedbackFilter, FeedbackRecord, NewFeedback, Sentiment};
use crate::orchestration::DispatchOutcome;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackListQuery {
    pub source: Option<String>,
    pub sentiment: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackCreatedResponse {
    pub id: i64,
    pub success: bool,
    pub dispatch: DispatchOutcome,
}

/// List feedback: GET /api/feedback
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<FeedbackListQuery>,
) -> ApiResult<Json<Vec<FeedbackRecord>>> {
    let sentiment = query
        .sentiment
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<Sentiment>)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let filter = FeedbackFilter {
        source: query.source.filter(|s| !s.is_empty()),
        sentiment,
        limit: state.page_size(query.limit),
        offset: query.offset.unwrap_or(0).max(0),
    };
    debug!(filter = ?filter, "Listing feedback");

    let rows = state.store.list(&filter).await?;
    Ok(Json(rows))
}

/// Create feedback and start its processing: POST /api/feedback
pub async fn create_feedback(
    State(state): State<AppState>,
    Json(request): Json<NewFeedback>,
) -> ApiResult<(StatusCode, Json<FeedbackCreatedResponse>)> {
    request.validate()?;

    let record = state.store.insert(&request).await?;
    info!(feedback_id = record.id, source = %record.source, "Feedback stored");

    let dispatch = state.dispatcher.dispatch(record.id).await;

    Ok((
        StatusCode::CREATED,
        Json(FeedbackCreatedResponse {
            id: record.id,
            success: true,
            dispatch,
        }),
    ))
}

/// Fetch one feedback row: GET /api/feedback/:id
pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<FeedbackRecord>> {
    state
        .store
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Feedback {id} not found")))
}
