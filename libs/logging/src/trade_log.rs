//! Trade logger
//!
//! Writes trade, execution, and confirmation records to the trade log file
//! through an [`AppLogger`]. Confirmation ids are monotone per logger.

use crate::app::AppLogger;
use crate::level::LogLevel;
use crate::sink::SinkError;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use types::numeric::{Price, Quantity};
use types::trade::Trade;

/// Acknowledgement record produced after a trade is processed.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeConfirmation {
    pub confirmation_id: String,
    pub trade_id: u64,
    pub symbol: String,
    pub quantity: Quantity,
    pub price: Price,
    pub timestamp_ms: i64,
    pub status: String,
}

/// Record writer for the trade log file.
pub struct TradeLogger {
    logger: AppLogger,
    next_confirmation_id: AtomicU64,
}

impl TradeLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            logger: AppLogger::new(path),
            next_confirmation_id: AtomicU64::new(1),
        }
    }

    pub fn start(&self) -> Result<(), SinkError> {
        self.logger.start()
    }

    pub fn stop(&self) {
        self.logger.stop();
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.logger.set_log_level(level);
    }

    pub fn enable_console_output(&self, enable: bool) {
        self.logger.enable_console_output(enable);
    }

    /// Free-form message on the trade log.
    pub fn log_message(&self, level: LogLevel, message: &str) {
        self.logger.log(level, message);
    }

    /// One line per trade.
    pub fn log_trade(&self, trade: &Trade) {
        self.logger.info(&format!(
            "TRADE id={} symbol={} qty={} price={} buy_order={} sell_order={} buy_user={} sell_user={} ts={}",
            trade.trade_id,
            trade.symbol,
            trade.quantity,
            trade.price,
            trade.buy_order_id,
            trade.sell_order_id,
            trade.buy_user_id,
            trade.sell_user_id,
            trade.timestamp_ms,
        ));
    }

    /// One line per execution-sink result.
    pub fn log_execution(
        &self,
        execution_id: &str,
        symbol: &str,
        quantity: Quantity,
        price: Price,
        status: &str,
    ) {
        self.logger.info(&format!(
            "EXECUTION id={execution_id} symbol={symbol} qty={quantity} price={price} status={status}"
        ));
    }

    /// Build a confirmation for a processed trade.
    pub fn create_confirmation(&self, trade: &Trade) -> TradeConfirmation {
        let id = self.next_confirmation_id.fetch_add(1, Ordering::Relaxed);
        TradeConfirmation {
            confirmation_id: format!("C{id}"),
            trade_id: trade.trade_id.value(),
            symbol: trade.symbol.as_str().to_string(),
            quantity: trade.quantity,
            price: trade.price,
            timestamp_ms: trade.timestamp_ms,
            status: "CONFIRMED".to_string(),
        }
    }

    /// Record a confirmation on the trade log.
    pub fn send_confirmation(&self, confirmation: &TradeConfirmation) {
        self.logger.info(&format!(
            "CONFIRMATION id={} trade_id={} symbol={} qty={} price={} status={}",
            confirmation.confirmation_id,
            confirmation.trade_id,
            confirmation.symbol,
            confirmation.quantity,
            confirmation.price,
            confirmation.status,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{OrderId, Symbol, TradeId, UserId};

    fn sample_trade() -> Trade {
        Trade::new(
            TradeId::new(1),
            OrderId::new("B1"),
            OrderId::new("S1"),
            UserId::new("u1"),
            UserId::new("u2"),
            Symbol::new("AAPL"),
            Quantity::from_u64(100),
            Price::from_u64(50),
            1_700_000_000_000,
        )
    }

    #[test]
    fn test_trade_and_confirmation_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.log");
        let logger = TradeLogger::new(&path);
        logger.start().unwrap();

        let trade = sample_trade();
        logger.log_trade(&trade);
        let confirmation = logger.create_confirmation(&trade);
        logger.send_confirmation(&confirmation);
        logger.stop();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("TRADE id=1 symbol=AAPL qty=100 price=50"));
        assert!(content.contains("CONFIRMATION id=C1 trade_id=1"));
    }

    #[test]
    fn test_confirmation_ids_are_monotone() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TradeLogger::new(dir.path().join("trades.log"));
        let trade = sample_trade();
        let c1 = logger.create_confirmation(&trade);
        let c2 = logger.create_confirmation(&trade);
        assert_eq!(c1.confirmation_id, "C1");
        assert_eq!(c2.confirmation_id, "C2");
    }
}
