//! # Web API Module
//!
//! Axum-based REST API for the feedback service.
//!
//! ## Core Components
//!
//! - [`routes`] - HTTP route definitions
//! - [`handlers`] - Request handlers per endpoint group
//! - [`state`] - Shared application state
//! - [`errors`] - JSON error responses

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

use crate::config::CorsConfig;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::Router;
use state::AppState;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::warn;

pub use errors::{ApiError, ApiResult};

/// Create the Axum application with all routes and middleware
pub fn create_app(app_state: AppState) -> Router {
    let request_timeout = app_state.config.request_timeout();
    let cors = build_cors_layer(&app_state.config.cors);

    Router::new()
        .merge(routes::health_routes())
        .nest("/api", routes::api_routes())
        .layer(tower_http::timeout::TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Translate the configured CORS policy; `"*"` in any list means any value
pub fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let wildcard = |values: &[String]| values.iter().any(|v| v.trim() == "*");

    let origins = if wildcard(&cors.allowed_origins) {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            cors.allowed_origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                }),
        )
    };

    let methods = if wildcard(&cors.allowed_methods) {
        AllowMethods::from(Any)
    } else {
        AllowMethods::list(
            cors.allowed_methods
                .iter()
                .filter_map(|method| Method::from_bytes(method.trim().as_bytes()).ok()),
        )
    };

    let headers = if wildcard(&cors.allowed_headers) {
        AllowHeaders::from(Any)
    } else {
        AllowHeaders::list(
            cors.allowed_headers
                .iter()
                .filter_map(|header| HeaderName::from_bytes(header.trim().as_bytes()).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
}
