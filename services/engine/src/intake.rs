//! Bus-subscriber order pipeline
//!
//! Runs on the bus consumer thread, which makes it the sole writer to the
//! matcher. Deep-parses each record, validates, and submits; parse and
//! validation failures are logged and the record is dropped (there is no
//! dead-letter topic).

use gateway::models::OrderRequest;
use logging::AppLogger;
use matching_engine::{EngineHandle, OrderValidator};
use std::sync::Arc;
use tracing::debug;

pub struct OrderIntake {
    engine: EngineHandle,
    validator: OrderValidator,
    app_logger: Arc<AppLogger>,
}

impl OrderIntake {
    pub fn new(engine: EngineHandle, validator: OrderValidator, app_logger: Arc<AppLogger>) -> Self {
        Self {
            engine,
            validator,
            app_logger,
        }
    }

    /// Handle one bus record.
    pub fn process_message(&self, message: &bus::Message) {
        self.process_body(&message.value);
    }

    /// Parse, validate, and submit one raw order body.
    pub fn process_body(&self, raw: &str) {
        let request: OrderRequest = match serde_json::from_str(raw) {
            Ok(request) => request,
            Err(err) => {
                self.app_logger
                    .error(&format!("Failed to parse order from queue: {err}"));
                return;
            }
        };

        let order_id = request.id.clone();
        self.app_logger
            .info(&format!("Processing order from queue: {order_id}"));

        let order = match request.into_order() {
            Ok(order) => order,
            Err(err) => {
                self.app_logger
                    .error(&format!("Invalid data in order from queue: {err}"));
                return;
            }
        };

        if let Err(err) = self.validator.validate(&order) {
            self.app_logger
                .error(&format!("Invalid order from queue rejected: {err}"));
            return;
        }

        match self.engine.submit_order(order) {
            Ok(outcome) => {
                let trades = outcome.trades().len();
                if trades > 0 {
                    self.app_logger
                        .info(&format!("Order {order_id} generated {trades} trades"));
                } else {
                    debug!(%order_id, "order produced no trades");
                }
            }
            Err(err) => {
                self.app_logger
                    .error(&format!("Failed to add order {order_id} to order book: {err}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matching_engine::MatchingEngine;
    use rust_decimal::Decimal;
    use types::ids::{OrderId, Symbol, UserId};
    use types::numeric::{Price, Quantity};

    fn intake(dir: &tempfile::TempDir) -> OrderIntake {
        let logger = Arc::new(AppLogger::new(dir.path().join("app.log")));
        logger.start().unwrap();
        OrderIntake::new(
            EngineHandle::new(MatchingEngine::new(Decimal::ZERO)),
            OrderValidator::new(),
            logger,
        )
    }

    fn body(id: &str, user: &str, side: &str, qty: u64, price: u64) -> String {
        format!(
            r#"{{"id":"{id}","userId":"{user}","symbol":"AAPL",
                "type":"LIMIT","side":"{side}","quantity":{qty},"price":{price}}}"#
        )
    }

    #[test]
    fn test_valid_orders_flow_to_matcher() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(&dir);

        intake.process_body(&body("S1", "u2", "SELL", 100, 50));
        intake.process_body(&body("B1", "u1", "BUY", 100, 50));

        let (trades, volume) = intake.engine.totals();
        assert_eq!(trades, 1);
        assert_eq!(volume, Decimal::from(5000));
    }

    #[test]
    fn test_malformed_json_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(&dir);
        intake.process_body("{ not json");
        assert_eq!(intake.engine.totals().0, 0);
    }

    #[test]
    fn test_missing_price_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(&dir);
        intake.process_body(
            r#"{"id":"B1","userId":"u1","symbol":"AAPL","type":"LIMIT","side":"BUY","quantity":100}"#,
        );
        assert_eq!(intake.engine.totals().0, 0);
        assert!(intake
            .engine
            .book_snapshot(&Symbol::new("AAPL"))
            .is_none());
    }

    #[test]
    fn test_validation_failure_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(&dir);
        // Quantity below the default minimum of 0.01.
        intake.process_body(
            r#"{"id":"B1","userId":"u1","symbol":"AAPL","type":"LIMIT","side":"BUY","quantity":0.001,"price":50}"#,
        );
        assert!(intake.engine.book_snapshot(&Symbol::new("AAPL")).is_none());
    }

    #[test]
    fn test_stop_order_rejected_by_validation() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(&dir);
        intake.process_body(
            r#"{"id":"X1","userId":"u1","symbol":"AAPL","type":"STOP","side":"BUY","quantity":10,"price":50}"#,
        );
        assert!(intake.engine.book_snapshot(&Symbol::new("AAPL")).is_none());
    }

    #[test]
    fn test_resting_order_lands_on_book() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(&dir);
        intake.process_body(&body("B1", "u1", "BUY", 100, 49));

        let order = intake
            .engine
            .find_order(&Symbol::new("AAPL"), &OrderId::new("B1"))
            .unwrap();
        assert_eq!(order.user_id, UserId::new("u1"));
        assert_eq!(order.quantity, Quantity::from_u64(100));
        assert_eq!(order.price, Price::from_u64(49));
    }
}
