use axum::extract::State;
use axum::Json;

use crate::models::FeedbackStats;
use crate::web::errors::ApiResult;
use crate::web::state::AppState;

/// Aggregate counts and daily trends: GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<FeedbackStats>> {
    let stats = state.store.stats(state.trend_window_days).await?;
    Ok(Json(stats))
}
