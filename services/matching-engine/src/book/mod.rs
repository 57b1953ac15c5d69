//! Per-symbol order book
//!
//! Two price-ordered halves plus an id index. The book has exclusive
//! ownership of every resting order; the matcher mutates remaining
//! quantities through the book so the index and level totals never drift.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::PriceLevel;

use rust_decimal::prelude::ToPrimitive;
use rustc_hash::FxHashMap;
use serde::Serialize;
use types::ids::{OrderId, Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};

/// Book admission errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookError {
    #[error("order symbol {order} does not match book symbol {book}")]
    SymbolMismatch { book: Symbol, order: Symbol },
    #[error("order id {0} already rests on the book")]
    DuplicateOrderId(OrderId),
}

/// Identity of the best resting order on one side.
#[derive(Debug, Clone, PartialEq)]
pub struct RestingBest {
    pub price: Price,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub available: Quantity,
}

/// One aggregated price level in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSnapshot {
    pub price: Price,
    pub quantity: Quantity,
}

/// Read-model copy of the book for the HTTP surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    pub bids: Vec<LevelSnapshot>,
    pub asks: Vec<LevelSnapshot>,
    pub best_bid: Price,
    pub best_ask: Price,
    pub spread: f64,
}

/// Two-sided price-time priority book for one symbol.
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BidBook,
    asks: AskBook,
    /// Where each resting order sits, for O(log n) removal and lookup.
    index: FxHashMap<OrderId, (Side, Price)>,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BidBook::new(),
            asks: AskBook::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Admit a resting order at its limit price.
    ///
    /// A fresh order is (re)stamped PENDING; a partially filled remainder
    /// keeps its PARTIALLY_FILLED status.
    pub fn add_order(&mut self, mut order: Order) -> Result<(), BookError> {
        if order.symbol != self.symbol {
            return Err(BookError::SymbolMismatch {
                book: self.symbol.clone(),
                order: order.symbol,
            });
        }
        if self.index.contains_key(&order.id) {
            return Err(BookError::DuplicateOrderId(order.id));
        }
        if order.filled_quantity.is_zero() {
            order.status = OrderStatus::Pending;
        }

        self.index.insert(order.id.clone(), (order.side, order.price));
        match order.side {
            Side::BUY => self.bids.insert(order),
            Side::SELL => self.asks.insert(order),
        }
        Ok(())
    }

    /// Remove a resting order by id.
    pub fn remove_order(&mut self, order_id: &OrderId) -> Option<Order> {
        let (side, price) = self.index.remove(order_id)?;
        match side {
            Side::BUY => self.bids.remove(order_id, price),
            Side::SELL => self.asks.remove(order_id, price),
        }
    }

    /// Look up a resting order by id.
    pub fn find_order(&self, order_id: &OrderId) -> Option<&Order> {
        let (side, price) = self.index.get(order_id)?;
        match side {
            Side::BUY => self.bids.find(order_id, *price),
            Side::SELL => self.asks.find(order_id, *price),
        }
    }

    /// Best bid price, or zero when the bid side is empty.
    pub fn best_bid(&self) -> Price {
        self.bids.best_price().unwrap_or(Price::ZERO)
    }

    /// Best ask price, or zero when the ask side is empty.
    pub fn best_ask(&self) -> Price {
        self.asks.best_price().unwrap_or(Price::ZERO)
    }

    /// `best_ask − best_bid`; negative when a side is empty.
    pub fn spread(&self) -> rust_decimal::Decimal {
        self.best_ask() - self.best_bid()
    }

    /// All buy orders, highest price first, FIFO within a level.
    pub fn buy_orders(&self) -> Vec<&Order> {
        self.bids.orders()
    }

    /// All sell orders, lowest price first, FIFO within a level.
    pub fn sell_orders(&self) -> Vec<&Order> {
        self.asks.orders()
    }

    /// Identity of the front order at the best price on `side`.
    pub fn resting_best(&self, side: Side) -> Option<RestingBest> {
        let front = match side {
            Side::BUY => self.bids.best_front()?,
            Side::SELL => self.asks.best_front()?,
        };
        Some(RestingBest {
            price: front.price,
            order_id: front.id.clone(),
            user_id: front.user_id.clone(),
            available: front.quantity,
        })
    }

    /// Fill the front order at the best price on `side`, dropping it from
    /// the book (and the id index) once complete.
    ///
    /// # Panics
    /// Panics if the side is empty or the fill exceeds what is available;
    /// callers size fills from [`resting_best`](Self::resting_best).
    pub fn fill_best(&mut self, side: Side, quantity: Quantity) {
        let completed = match side {
            Side::BUY => {
                let (price, level) = self
                    .bids
                    .best_level_mut()
                    .expect("fill_best on empty bid side");
                let completed = level.fill_front(quantity);
                self.bids.remove_level_if_empty(price);
                completed
            }
            Side::SELL => {
                let (price, level) = self
                    .asks
                    .best_level_mut()
                    .expect("fill_best on empty ask side");
                let completed = level.fill_front(quantity);
                self.asks.remove_level_if_empty(price);
                completed
            }
        };
        if let Some(order) = completed {
            self.index.remove(&order.id);
        }
    }

    /// Number of resting orders across both sides.
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Aggregated copy for readers.
    pub fn snapshot(&self) -> BookSnapshot {
        let to_levels = |levels: Vec<(Price, Quantity)>| {
            levels
                .into_iter()
                .map(|(price, quantity)| LevelSnapshot { price, quantity })
                .collect()
        };
        BookSnapshot {
            symbol: self.symbol.clone(),
            bids: to_levels(self.bids.depth()),
            asks: to_levels(self.asks.depth()),
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
            spread: self.spread().to_f64().unwrap_or(0.0),
        }
    }
}
