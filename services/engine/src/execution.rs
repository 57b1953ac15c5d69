//! Execution sink
//!
//! The last hop of the trade fan-out: stamps each trade with an execution
//! id, keeps totals, and notifies an optional callback. Runs on the worker
//! pool so the matcher never waits on it.

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use types::ids::Symbol;
use types::numeric::{Price, Quantity};
use types::trade::Trade;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failed => "FAILED",
        }
    }
}

/// Outcome record for one executed trade.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub execution_id: String,
    pub symbol: Symbol,
    pub executed_quantity: Quantity,
    pub executed_price: Price,
    pub error: Option<String>,
}

pub type ExecutionCallback = Arc<dyn Fn(&ExecutionResult) + Send + Sync>;

/// Stateful execution recorder.
pub struct Executor {
    next_execution_id: AtomicU64,
    total_executions: AtomicU64,
    total_executed_volume: Mutex<Decimal>,
    callback: RwLock<Option<ExecutionCallback>>,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            next_execution_id: AtomicU64::new(1),
            total_executions: AtomicU64::new(0),
            total_executed_volume: Mutex::new(Decimal::ZERO),
            callback: RwLock::new(None),
        }
    }

    pub fn set_execution_callback(&self, callback: ExecutionCallback) {
        *self.callback.write() = Some(callback);
    }

    /// Record the execution of one trade.
    pub fn execute(&self, trade: &Trade) -> ExecutionResult {
        let id = self.next_execution_id.fetch_add(1, Ordering::Relaxed);
        let execution_id = format!("E{id}");

        let result = if trade.quantity.is_zero() || trade.price.is_zero() {
            ExecutionResult {
                status: ExecutionStatus::Failed,
                execution_id,
                symbol: trade.symbol.clone(),
                executed_quantity: trade.quantity,
                executed_price: trade.price,
                error: Some("trade has no executable quantity or price".to_string()),
            }
        } else {
            self.total_executions.fetch_add(1, Ordering::Relaxed);
            *self.total_executed_volume.lock() += trade.notional();
            ExecutionResult {
                status: ExecutionStatus::Success,
                execution_id,
                symbol: trade.symbol.clone(),
                executed_quantity: trade.quantity,
                executed_price: trade.price,
                error: None,
            }
        };

        if let Some(callback) = self.callback.read().as_ref() {
            callback(&result);
        }
        result
    }

    pub fn total_executions(&self) -> u64 {
        self.total_executions.load(Ordering::Relaxed)
    }

    pub fn total_executed_volume(&self) -> Decimal {
        *self.total_executed_volume.lock()
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{OrderId, TradeId, UserId};

    fn trade(qty: u64, price: u64) -> Trade {
        Trade::new(
            TradeId::new(1),
            OrderId::new("B1"),
            OrderId::new("S1"),
            UserId::new("u1"),
            UserId::new("u2"),
            Symbol::new("AAPL"),
            Quantity::from_u64(qty),
            Price::from_u64(price),
            0,
        )
    }

    #[test]
    fn test_successful_execution() {
        let executor = Executor::new();
        let result = executor.execute(&trade(100, 50));
        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.execution_id, "E1");
        assert_eq!(executor.total_executions(), 1);
        assert_eq!(executor.total_executed_volume(), Decimal::from(5000));
    }

    #[test]
    fn test_execution_ids_monotone() {
        let executor = Executor::new();
        assert_eq!(executor.execute(&trade(1, 1)).execution_id, "E1");
        assert_eq!(executor.execute(&trade(1, 1)).execution_id, "E2");
    }

    #[test]
    fn test_degenerate_trade_fails() {
        let executor = Executor::new();
        let result = executor.execute(&trade(0, 50));
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(result.error.is_some());
        assert_eq!(executor.total_executions(), 0);
    }

    #[test]
    fn test_callback_invoked() {
        let executor = Executor::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            executor.set_execution_callback(Arc::new(move |result: &ExecutionResult| {
                seen.lock().push(result.execution_id.clone());
            }));
        }
        executor.execute(&trade(1, 1));
        executor.execute(&trade(2, 2));
        assert_eq!(*seen.lock(), vec!["E1".to_string(), "E2".to_string()]);
    }
}
