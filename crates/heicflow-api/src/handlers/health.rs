use axum::{http::StatusCode, response::IntoResponse, Json};

/// Liveness check: the process is up.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
