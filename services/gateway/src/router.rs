//! Route table

use crate::handlers::{book, leaderboard, order, stats};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/order", post(order::submit_order))
        .route("/health", get(order::health))
        .route("/api/v1/orderbook/:symbol", get(book::get_orderbook))
        .route("/api/v1/stats/all", get(stats::get_all_stats))
        .route("/api/v1/stats/summary", get(stats::get_summary))
        .route("/api/v1/stats/:symbol", get(stats::get_symbol_stats))
        .route(
            "/api/v1/stats/:symbol/:timeframe",
            get(stats::get_symbol_timeframe_stats),
        )
        .route("/api/v1/leaderboard", get(leaderboard::get_leaderboard))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
