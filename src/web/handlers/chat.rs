use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::services::ChatReply;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

/// Ask about recent feedback: POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatReply>> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query cannot be empty"));
    }

    let reply = state.chat.answer(&request.query).await?;
    Ok(Json(reply))
}
