//! Trade fan-out
//!
//! The matcher emits trades; this fan-out forwards each one to its sinks
//! in order: the durable trade log, the statistics collector (non-blocking
//! submit), the execution sink on the worker pool, and a confirmation
//! record. Everything here is enqueue-only from the caller's perspective,
//! so the matcher thread never blocks on I/O.

use crate::execution::Executor;
use concurrent::ThreadPool;
use logging::TradeLogger;
use market_stats::StatsCollector;
use matching_engine::engine::TradeCallback;
use std::sync::Arc;
use tracing::warn;
use types::trade::Trade;

pub struct TradeSinks {
    trade_logger: Arc<TradeLogger>,
    stats: Arc<StatsCollector>,
    executor: Arc<Executor>,
    pool: Arc<ThreadPool>,
}

impl TradeSinks {
    pub fn new(
        trade_logger: Arc<TradeLogger>,
        stats: Arc<StatsCollector>,
        executor: Arc<Executor>,
        pool: Arc<ThreadPool>,
    ) -> Self {
        Self {
            trade_logger,
            stats,
            executor,
            pool,
        }
    }

    /// Forward one trade to every sink.
    pub fn handle_trade(&self, trade: &Trade) {
        self.trade_logger.log_trade(trade);

        if self.stats.is_running() && !self.stats.submit_trade(trade) {
            warn!(trade_id = %trade.trade_id, "statistics queue full, trade dropped");
        }

        {
            let executor = Arc::clone(&self.executor);
            let trade = trade.clone();
            let trade_id = trade.trade_id;
            if self.pool.execute(move || {
                executor.execute(&trade);
            }).is_err()
            {
                warn!(trade_id = %trade_id, "execution pool shut down, trade not executed");
            }
        }

        let confirmation = self.trade_logger.create_confirmation(trade);
        self.trade_logger.send_confirmation(&confirmation);
    }

    /// Adapt into the matcher's trade callback.
    pub fn into_callback(self) -> TradeCallback {
        let sinks = Arc::new(self);
        Arc::new(move |trade: &Trade| sinks.handle_trade(trade))
    }
}
