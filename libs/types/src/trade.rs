//! Trade execution types
//!
//! A trade records one fill between a buy order and a sell order. Trades
//! are immutable once constructed and flow to the trade logger, the
//! statistics collector, and the execution sink.

use crate::ids::{OrderId, Symbol, TradeId, UserId};
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One fill between two orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buy_user_id: UserId,
    pub sell_user_id: UserId,
    pub symbol: Symbol,
    pub quantity: Quantity,
    pub price: Price,
    /// Wall-clock milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_id: TradeId,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        buy_user_id: UserId,
        sell_user_id: UserId,
        symbol: Symbol,
        quantity: Quantity,
        price: Price,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            trade_id,
            buy_order_id,
            sell_order_id,
            buy_user_id,
            sell_user_id,
            symbol,
            quantity,
            price,
            timestamp_ms,
        }
    }

    /// Trade notional (price × quantity).
    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_notional() {
        assert_eq!(sample_trade().notional(), Decimal::from(5000));
    }

    #[test]
    fn test_trade_serialization() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, back);
    }
}
