//! Service-level handlers

use axum::http::StatusCode;

/// GET /health - Liveness check; never touches the object store
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
