//! Net-worth leaderboard endpoint

use crate::handlers::now_secs;
use crate::state::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// `GET /api/v1/leaderboard` — users sorted by net worth descending.
///
/// Positions are marked at the mid of the best bid/ask when both quote,
/// else whichever side quotes, else the position's average price.
pub async fn get_leaderboard(State(state): State<AppState>) -> Response {
    let snapshot = state.engine.leaderboard();
    Json(json!({
        "timestamp": now_secs(),
        "total_users": snapshot.total_users,
        "leaderboard": snapshot.entries,
    }))
    .into_response()
}
