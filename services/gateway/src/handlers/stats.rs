//! Statistics read endpoints
//!
//! All responses are snapshots copied out of the collector; the summary
//! aggregates every symbol's current `1m` bucket into market-wide totals.

use crate::error::ApiError;
use crate::handlers::now_secs;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use market_stats::{InstrumentStats, Timeframe};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use types::ids::Symbol;
use types::numeric::{Price, Quantity};

fn require_running(state: &AppState) -> Result<(), ApiError> {
    if state.stats.is_running() {
        Ok(())
    } else {
        Err(ApiError::ServiceUnavailable(
            "Statistics collector not available".into(),
        ))
    }
}

/// `GET /api/v1/stats/all`
pub async fn get_all_stats(State(state): State<AppState>) -> Result<Response, ApiError> {
    require_running(&state)?;

    let all: BTreeMap<String, InstrumentStats> = state
        .stats
        .all_stats()
        .into_iter()
        .map(|(symbol, stats)| (symbol.as_str().to_string(), stats))
        .collect();

    Ok(Json(json!({
        "timestamp": now_secs(),
        "total_symbols": all.len(),
        "symbols": all,
    }))
    .into_response())
}

/// `GET /api/v1/stats/summary` — market-wide aggregates over the current
/// `1m` bucket of every symbol.
pub async fn get_summary(State(state): State<AppState>) -> Result<Response, ApiError> {
    require_running(&state)?;

    let all = state.stats.all_stats();

    let mut total_volume = Quantity::ZERO;
    let mut total_dollar_volume = Decimal::ZERO;
    let mut total_trades = 0u64;
    let mut max_price = Price::ZERO;
    let mut min_price: Option<Price> = None;

    for stats in all.values() {
        let Some(bucket) = stats.timeframes.get(&Timeframe::M1) else {
            continue;
        };
        if bucket.is_empty() {
            continue;
        }
        total_volume += bucket.volume;
        total_dollar_volume += bucket.dollar_volume;
        total_trades += bucket.trade_count;
        max_price = max_price.max(bucket.high);
        if !bucket.low.is_zero() {
            min_price = Some(match min_price {
                Some(current) => current.min(bucket.low),
                None => bucket.low,
            });
        }
    }

    Ok(Json(json!({
        "timestamp": now_secs(),
        "total_symbols": all.len(),
        "total_trades_processed": state.stats.total_trades_processed(),
        "total_trades_dropped": state.stats.total_trades_dropped(),
        "queue_size": state.stats.queue_size(),
        "market_summary": {
            "total_volume": total_volume,
            "total_dollar_volume": total_dollar_volume.to_f64().unwrap_or(0.0),
            "total_trades": total_trades,
            "price_range": {
                "min": min_price.unwrap_or(Price::ZERO),
                "max": max_price,
            },
        },
    }))
    .into_response())
}

/// `GET /api/v1/stats/:symbol`
pub async fn get_symbol_stats(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Response, ApiError> {
    require_running(&state)?;

    let symbol = Symbol::try_new(symbol)
        .ok_or_else(|| ApiError::BadRequest("Missing symbol parameter".into()))?;
    let stats = state.stats.stats_for_symbol(&symbol).ok_or_else(|| {
        ApiError::NotFound(format!("No statistics available for symbol: {symbol}"))
    })?;

    Ok(Json(json!({
        "symbol": symbol,
        "timestamp": now_secs(),
        "data": stats,
    }))
    .into_response())
}

/// `GET /api/v1/stats/:symbol/:timeframe`
pub async fn get_symbol_timeframe_stats(
    State(state): State<AppState>,
    Path((symbol, timeframe)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    require_running(&state)?;

    let symbol = Symbol::try_new(symbol)
        .ok_or_else(|| ApiError::BadRequest("Missing symbol parameter".into()))?;
    let stats = state.stats.stats_for_symbol(&symbol).ok_or_else(|| {
        ApiError::NotFound(format!("No statistics available for symbol: {symbol}"))
    })?;

    let bucket = Timeframe::from_label(&timeframe)
        .and_then(|tf| stats.timeframes.get(&tf))
        .ok_or_else(|| {
            ApiError::NotFound(format!("No data available for timeframe: {timeframe}"))
        })?;

    Ok(Json(json!({
        "symbol": symbol,
        "timestamp": now_secs(),
        "timeframe": timeframe,
        "data": bucket,
        "last_trade_price": stats.last_trade_price,
    }))
    .into_response())
}
