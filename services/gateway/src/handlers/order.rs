//! Order intake and health
//!
//! `POST /order` is the write fast path: shallow-validate the body (it
//! must be JSON with string `id` and `userId`), publish it verbatim to
//! the bus keyed by user, and acknowledge with 202. Deep parsing and
//! validation happen on the consumer side.

use crate::error::ApiError;
use crate::handlers::now_secs;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use tracing::error;

pub async fn submit_order(
    State(state): State<AppState>,
    body: String,
) -> Result<Response, ApiError> {
    let parsed: Value = serde_json::from_str(&body)
        .map_err(|err| ApiError::BadRequest(format!("Invalid JSON format: {err}")))?;

    let order_id = parsed
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("Request must contain 'userId' and 'id'".into()))?;
    let user_id = parsed
        .get("userId")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("Request must contain 'userId' and 'id'".into()))?;

    if let Err(err) = state.bus.publish(bus::ORDER_TOPIC, user_id, &body) {
        error!(%err, order_id, "failed to publish order to queue");
        return Err(ApiError::Internal(
            "Failed to queue order for processing".into(),
        ));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "order accepted for processing",
            "order_id": order_id,
        })),
    )
        .into_response())
}

pub async fn health(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "healthy",
        "running": state.running.load(Ordering::Acquire),
        "timestamp": now_secs(),
    }))
    .into_response()
}
