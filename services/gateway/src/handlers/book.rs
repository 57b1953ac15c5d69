//! Order book read endpoint

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use types::ids::Symbol;

/// `GET /api/v1/orderbook/:symbol`
pub async fn get_orderbook(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Response, ApiError> {
    let symbol = Symbol::try_new(symbol)
        .ok_or_else(|| ApiError::BadRequest("Symbol parameter is required".into()))?;

    match state.engine.book_snapshot(&symbol) {
        Some(snapshot) => Ok(Json(snapshot).into_response()),
        None => Err(ApiError::NotFound(format!(
            "Order book not found for symbol: {symbol}"
        ))),
    }
}
