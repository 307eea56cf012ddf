//! Storage finalize event receiver.

use crate::error::{ErrorResponse, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use heicflow_core::StorageEvent;
use std::sync::Arc;

/// Run one pipeline invocation for a finalize event.
///
/// Converted and skipped events answer `200`. Failures answer `503` when
/// redelivery may help and `422` when it cannot, so push-delivery runtimes
/// only retry the former. An invocation over its time budget is abandoned
/// (its scratch directory is dropped with it) and answers `504`.
pub async fn object_finalized(
    State(state): State<Arc<AppState>>,
    ValidatedJson(event): ValidatedJson<StorageEvent>,
) -> Response {
    let result = tokio::time::timeout(state.invocation_timeout, state.pipeline.handle(&event)).await;

    match result {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(outcome)).into_response(),
        Ok(Err(e)) => {
            let status = if e.is_retryable() {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            (status, Json(e.to_outcome())).into_response()
        }
        Err(_) => {
            tracing::error!(
                object_path = event.object_path.as_deref().unwrap_or(""),
                timeout_secs = state.invocation_timeout.as_secs_f64(),
                "Invocation timed out"
            );
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(ErrorResponse::new(
                    "Invocation timed out",
                    "INVOCATION_TIMEOUT",
                    true,
                )),
            )
                .into_response()
        }
    }
}
