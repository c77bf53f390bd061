//! Health API Handler
//!
//! Liveness endpoint for the broker process.

use axum::{http::StatusCode, response::IntoResponse};

/// GET /health
/// Report that the broker is up
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
