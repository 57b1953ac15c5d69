//! Order lifecycle types
//!
//! `Order.quantity` is the quantity still open; the matcher decrements it
//! in place as fills occur and `filled_quantity` grows by the same amount,
//! so `quantity + filled_quantity` is always the original size.

use crate::ids::{OrderId, Symbol, UserId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// Order type
///
/// STOP is accepted on the wire but rejected by validation; the matching
/// core only ever sees LIMIT and MARKET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    LIMIT,
    MARKET,
    STOP,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted and awaiting matching
    Pending,
    /// Partially matched
    PartiallyFilled,
    /// Completely matched (terminal)
    Filled,
    /// Failed validation (terminal)
    Rejected,
    /// Cancelled by user or system (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }
}

/// An order as held by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub order_type: OrderType,
    pub side: Side,
    /// Quantity still open (decremented by fills).
    pub quantity: Quantity,
    /// Limit price; zero for MARKET orders.
    pub price: Price,
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
}

impl Order {
    /// Create a new pending order.
    ///
    /// The price of a MARKET order is forced to zero regardless of input.
    pub fn new(
        id: OrderId,
        user_id: UserId,
        symbol: Symbol,
        order_type: OrderType,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Self {
        let price = match order_type {
            OrderType::MARKET => Price::ZERO,
            _ => price,
        };
        Self {
            id,
            user_id,
            symbol,
            order_type,
            side,
            quantity,
            price,
            filled_quantity: Quantity::ZERO,
            status: OrderStatus::Pending,
        }
    }

    /// Quantity the order was submitted with.
    pub fn original_quantity(&self) -> Quantity {
        self.quantity + self.filled_quantity
    }

    /// Check if the order is completely filled.
    pub fn is_filled(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Record a fill, decrementing the open quantity and updating status.
    ///
    /// # Panics
    /// Panics if the fill exceeds the open quantity.
    pub fn fill(&mut self, fill_quantity: Quantity) {
        self.quantity -= fill_quantity;
        self.filled_quantity += fill_quantity;
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }
}
