//! Wire models
//!
//! The order message carried both in the HTTP body and as the bus record
//! value:
//!
//! ```json
//! { "id": "B1", "userId": "u1", "symbol": "AAPL",
//!   "type": "LIMIT", "side": "BUY", "quantity": 100, "price": 50.0 }
//! ```
//!
//! `price` is required for LIMIT and STOP, ignored for MARKET.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::ids::{OrderId, Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderParseError {
    #[error("price is required for {0:?} orders")]
    MissingPrice(OrderType),
    #[error("symbol must be non-empty")]
    EmptySymbol,
}

/// Deep-parsed order request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: Side,
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

impl OrderRequest {
    /// Convert into a domain order, enforcing the price requirement.
    pub fn into_order(self) -> Result<Order, OrderParseError> {
        let price = match self.order_type {
            OrderType::MARKET => Price::ZERO,
            OrderType::LIMIT | OrderType::STOP => self
                .price
                .ok_or(OrderParseError::MissingPrice(self.order_type))?,
        };
        let symbol = Symbol::try_new(self.symbol).ok_or(OrderParseError::EmptySymbol)?;
        Ok(Order::new(
            OrderId::new(self.id),
            UserId::new(self.user_id),
            symbol,
            self.order_type,
            self.side,
            self.quantity,
            price,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit_order() {
        let raw = r#"{"id":"B1","userId":"u1","symbol":"AAPL",
                      "type":"LIMIT","side":"BUY","quantity":100,"price":50.0}"#;
        let request: OrderRequest = serde_json::from_str(raw).unwrap();
        let order = request.into_order().unwrap();
        assert_eq!(order.id, OrderId::new("B1"));
        assert_eq!(order.user_id, UserId::new("u1"));
        assert_eq!(order.order_type, OrderType::LIMIT);
        assert_eq!(order.side, Side::BUY);
        assert_eq!(order.quantity, Quantity::from_u64(100));
        assert_eq!(order.price, Price::from_u64(50));
    }

    #[test]
    fn test_market_order_needs_no_price() {
        let raw = r#"{"id":"M1","userId":"u1","symbol":"AAPL",
                      "type":"MARKET","side":"SELL","quantity":10}"#;
        let request: OrderRequest = serde_json::from_str(raw).unwrap();
        let order = request.into_order().unwrap();
        assert!(order.price.is_zero());
    }

    #[test]
    fn test_limit_without_price_rejected() {
        let raw = r#"{"id":"B1","userId":"u1","symbol":"AAPL",
                      "type":"LIMIT","side":"BUY","quantity":100}"#;
        let request: OrderRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(
            request.into_order(),
            Err(OrderParseError::MissingPrice(OrderType::LIMIT))
        );
    }

    #[test]
    fn test_unknown_enum_value_fails_parse() {
        let raw = r#"{"id":"B1","userId":"u1","symbol":"AAPL",
                      "type":"ICEBERG","side":"BUY","quantity":100,"price":50.0}"#;
        assert!(serde_json::from_str::<OrderRequest>(raw).is_err());
    }

    #[test]
    fn test_empty_symbol_rejected() {
        let raw = r#"{"id":"B1","userId":"u1","symbol":"",
                      "type":"LIMIT","side":"BUY","quantity":100,"price":50.0}"#;
        let request: OrderRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.into_order(), Err(OrderParseError::EmptySymbol));
    }

    #[test]
    fn test_negative_quantity_fails_parse() {
        let raw = r#"{"id":"B1","userId":"u1","symbol":"AAPL",
                      "type":"LIMIT","side":"BUY","quantity":-5,"price":50.0}"#;
        assert!(serde_json::from_str::<OrderRequest>(raw).is_err());
    }
}
