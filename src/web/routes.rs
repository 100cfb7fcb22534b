//! # Web API Route Definitions
//!
//! Routes are grouped by area and merged in [`crate::web::create_app`].

use crate::web::handlers;
use crate::web::state::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Feedback, analysis, chat and statistics routes under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Feedback API
        .route(
            "/feedback",
            get(handlers::feedback::list_feedback).post(handlers::feedback::create_feedback),
        )
        .route("/feedback/:id", get(handlers::feedback::get_feedback))
        // Analysis API
        .route("/analyze", post(handlers::analysis::analyze_feedback))
        .route("/process-pending", post(handlers::analysis::process_pending))
        // Chat and statistics
        .route("/chat", post(handlers::chat::chat))
        .route("/stats", get(handlers::stats::get_stats))
        // Workflow instance inspection
        .route(
            "/workflows/:instance_id",
            get(handlers::workflows::get_workflow),
        )
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
