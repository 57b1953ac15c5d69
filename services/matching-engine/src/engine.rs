//! Matching engine core
//!
//! Owns every order book and user portfolio, allocates trade ids, and
//! applies per-trade side effects in a fixed order: counters, portfolio
//! legs (fee 0, lazy user creation), then the trade callback.
//!
//! Pricing rules:
//! - MARKET: the fill price is captured once from the opposite top of book
//!   at entry; the walk refuses resting orders beyond that price, and any
//!   unfilled remainder is discarded.
//! - LIMIT: every fill prices at the incoming order's limit; the walk
//!   stops at the first resting order that does not cross. The remainder
//!   rests on the book.
//!
//! A failed portfolio leg is logged and skipped; the trade, the book, and
//! the other leg stand. Funding is a post-facto consistency layer here,
//! not a pre-trade check.

use crate::book::{BookError, BookSnapshot, OrderBook};
use crate::matching::crossing;
use crate::portfolio::{PortfolioError, Position, User};
use parking_lot::RwLock;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::warn;
use types::ids::{OrderId, Symbol, TradeId, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side};
use types::trade::Trade;

/// Invoked synchronously for every trade, in emission order.
pub type TradeCallback = Arc<dyn Fn(&Trade) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("order type {0:?} is not supported by the matching core")]
    UnsupportedOrderType(OrderType),
    #[error(transparent)]
    Book(#[from] BookError),
}

/// What happened to a submitted order.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// No fill; the limit order rests on the book.
    Rested,
    /// Completely filled.
    Filled { trades: Vec<Trade> },
    /// Some fills; a limit remainder rests, a market remainder is
    /// discarded.
    PartiallyFilled { trades: Vec<Trade>, rested: bool },
    /// Market order with an empty opposite side; nothing happened.
    NoLiquidity,
}

impl SubmitOutcome {
    /// Trades emitted by this submission.
    pub fn trades(&self) -> &[Trade] {
        match self {
            SubmitOutcome::Filled { trades } | SubmitOutcome::PartiallyFilled { trades, .. } => {
                trades
            }
            _ => &[],
        }
    }
}

/// One fill recorded during the matching walk, before trade construction.
struct Fill {
    buy_order_id: OrderId,
    sell_order_id: OrderId,
    buy_user_id: UserId,
    sell_user_id: UserId,
    quantity: Quantity,
    price: Price,
}

/// Price-time priority matcher over per-symbol books and a user registry.
///
/// Single-writer by contract: all mutation goes through one thread (the
/// bus consumer); use [`EngineHandle`] to share across threads.
pub struct MatchingEngine {
    books: FxHashMap<Symbol, OrderBook>,
    users: FxHashMap<UserId, User>,
    next_trade_id: u64,
    total_trades: u64,
    /// Sum of trade notionals.
    total_volume: Decimal,
    starting_cash: Decimal,
    trade_callback: Option<TradeCallback>,
}

impl MatchingEngine {
    /// Create an engine; users are created lazily with `starting_cash`.
    pub fn new(starting_cash: Decimal) -> Self {
        Self {
            books: FxHashMap::default(),
            users: FxHashMap::default(),
            next_trade_id: 1,
            total_trades: 0,
            total_volume: Decimal::ZERO,
            starting_cash,
            trade_callback: None,
        }
    }

    pub fn set_trade_callback(&mut self, callback: TradeCallback) {
        self.trade_callback = Some(callback);
    }

    /// Match an incoming order against its book, emitting trades and
    /// applying side effects per fill. The book is created lazily on the
    /// first order for a symbol.
    pub fn submit_order(&mut self, mut order: Order) -> Result<SubmitOutcome, EngineError> {
        if order.order_type == OrderType::STOP {
            return Err(EngineError::UnsupportedOrderType(OrderType::STOP));
        }

        let symbol = order.symbol.clone();
        let book = self
            .books
            .entry(symbol.clone())
            .or_insert_with(|| OrderBook::new(symbol.clone()));

        let fills = match order.order_type {
            OrderType::LIMIT => {
                let limit = order.price;
                match_walk(book, &mut order, limit)
            }
            OrderType::MARKET => {
                let captured = match order.side {
                    Side::BUY => book.best_ask(),
                    Side::SELL => book.best_bid(),
                };
                if captured.is_zero() {
                    return Ok(SubmitOutcome::NoLiquidity);
                }
                match_walk(book, &mut order, captured)
            }
            OrderType::STOP => unreachable!("rejected above"),
        };

        let timestamp_ms = now_ms();
        let mut trades = Vec::with_capacity(fills.len());
        for fill in fills {
            let trade = Trade::new(
                TradeId::new(self.next_trade_id),
                fill.buy_order_id,
                fill.sell_order_id,
                fill.buy_user_id,
                fill.sell_user_id,
                symbol.clone(),
                fill.quantity,
                fill.price,
                timestamp_ms,
            );
            self.next_trade_id += 1;
            self.apply_trade(&trade);
            trades.push(trade);
        }

        if order.is_filled() {
            return Ok(SubmitOutcome::Filled { trades });
        }

        match order.order_type {
            OrderType::LIMIT => {
                let had_fills = !trades.is_empty();
                // Split borrows: the walk released the book above.
                let book = self.books.get_mut(&symbol).unwrap();
                book.add_order(order)?;
                if had_fills {
                    Ok(SubmitOutcome::PartiallyFilled {
                        trades,
                        rested: true,
                    })
                } else {
                    Ok(SubmitOutcome::Rested)
                }
            }
            // A market remainder is discarded, never parked.
            _ => Ok(SubmitOutcome::PartiallyFilled {
                trades,
                rested: false,
            }),
        }
    }

    /// Per-trade side effects, in order: counters, portfolios, callback.
    fn apply_trade(&mut self, trade: &Trade) {
        self.total_trades += 1;
        self.total_volume += trade.notional();

        let fee = Decimal::ZERO;
        let buyer = self.get_or_create_user(&trade.buy_user_id);
        if let Err(err) =
            buyer.apply_execution(Side::BUY, &trade.symbol, trade.quantity, trade.price, fee)
        {
            warn!(
                user = %trade.buy_user_id,
                trade_id = %trade.trade_id,
                %err,
                "buy leg rejected; trade stands"
            );
        }
        let seller = self.get_or_create_user(&trade.sell_user_id);
        if let Err(err) =
            seller.apply_execution(Side::SELL, &trade.symbol, trade.quantity, trade.price, fee)
        {
            warn!(
                user = %trade.sell_user_id,
                trade_id = %trade.trade_id,
                %err,
                "sell leg rejected; trade stands"
            );
        }

        if let Some(callback) = &self.trade_callback {
            callback(trade);
        }
    }

    /// Register a pre-built user. Replaces any user with the same id.
    pub fn add_user(&mut self, user: User) {
        self.users.insert(user.user_id().clone(), user);
    }

    pub fn user(&self, user_id: &UserId) -> Option<&User> {
        self.users.get(user_id)
    }

    /// Fetch a user, creating one with the configured starting cash on
    /// first reference.
    pub fn get_or_create_user(&mut self, user_id: &UserId) -> &mut User {
        let starting_cash = self.starting_cash;
        self.users
            .entry(user_id.clone())
            .or_insert_with(|| User::new(user_id.clone(), starting_cash))
    }

    pub fn book(&self, symbol: &Symbol) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Fetch a book, creating it if the symbol is new.
    pub fn get_or_create_book(&mut self, symbol: &Symbol) -> &mut OrderBook {
        self.books
            .entry(symbol.clone())
            .or_insert_with(|| OrderBook::new(symbol.clone()))
    }

    pub fn total_trades(&self) -> u64 {
        self.total_trades
    }

    pub fn total_volume(&self) -> Decimal {
        self.total_volume
    }

    pub fn book_snapshot(&self, symbol: &Symbol) -> Option<BookSnapshot> {
        self.books.get(symbol).map(OrderBook::snapshot)
    }

    /// Mark price for a position: mid when both sides quote, else the
    /// quoting side, else the position's average price.
    fn mark_price(&self, symbol: &Symbol, fallback: Price) -> Price {
        let Some(book) = self.books.get(symbol) else {
            return fallback;
        };
        let bid = book.best_bid();
        let ask = book.best_ask();
        if !bid.is_zero() && !ask.is_zero() {
            Price::new((bid.as_decimal() + ask.as_decimal()) / Decimal::from(2))
        } else if !bid.is_zero() {
            bid
        } else if !ask.is_zero() {
            ask
        } else {
            fallback
        }
    }

    /// Users ranked by net worth (cash + marked positions), descending.
    pub fn leaderboard(&self) -> LeaderboardSnapshot {
        let mut entries: Vec<LeaderboardEntry> = self
            .users
            .values()
            .map(|user| {
                let mut portfolio_value = Decimal::ZERO;
                let mut positions = Vec::new();
                for (symbol, position) in user.positions() {
                    if position.quantity.is_zero() {
                        continue;
                    }
                    let current_price = self.mark_price(symbol, position.average_price);
                    let market_value = position.quantity * current_price;
                    portfolio_value += market_value;
                    positions.push(PositionDetail {
                        symbol: symbol.clone(),
                        quantity: position.quantity,
                        average_price: position.average_price,
                        current_price,
                        market_value: market_value.to_f64().unwrap_or(0.0),
                        unrealized_pnl: ((current_price - position.average_price)
                            * position.quantity.as_decimal())
                        .to_f64()
                        .unwrap_or(0.0),
                    });
                }
                let net_worth = user.cash_balance() + portfolio_value;
                LeaderboardEntry {
                    rank: 0,
                    user_id: user.user_id().clone(),
                    net_worth: net_worth.to_f64().unwrap_or(0.0),
                    cash_balance: user.cash_balance().to_f64().unwrap_or(0.0),
                    realized_pnl: user.realized_pnl().to_f64().unwrap_or(0.0),
                    portfolio_value: portfolio_value.to_f64().unwrap_or(0.0),
                    positions,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.net_worth
                .partial_cmp(&a.net_worth)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.rank = (index + 1) as u32;
        }
        LeaderboardSnapshot {
            total_users: entries.len(),
            entries,
        }
    }

    /// Copy of one user's portfolio state.
    pub fn user_snapshot(&self, user_id: &UserId) -> Option<UserSnapshot> {
        self.users.get(user_id).map(|user| UserSnapshot {
            user_id: user.user_id().clone(),
            cash_balance: user.cash_balance(),
            realized_pnl: user.realized_pnl(),
            positions: user.positions().clone(),
        })
    }
}

/// Walk the opposite side best-first, filling at `taker_price` until the
/// incoming order is done or the next resting order no longer crosses.
fn match_walk(book: &mut OrderBook, incoming: &mut Order, taker_price: Price) -> Vec<Fill> {
    let opposite = incoming.side.opposite();
    let mut fills = Vec::new();

    while !incoming.is_filled() {
        let Some(resting) = book.resting_best(opposite) else {
            break;
        };
        if !crossing::crosses(incoming.side, taker_price, resting.price) {
            break;
        }

        let fill_quantity = incoming.quantity.min(resting.available);
        incoming.fill(fill_quantity);
        book.fill_best(opposite, fill_quantity);

        let (buy_order_id, sell_order_id, buy_user_id, sell_user_id) = match incoming.side {
            Side::BUY => (
                incoming.id.clone(),
                resting.order_id,
                incoming.user_id.clone(),
                resting.user_id,
            ),
            Side::SELL => (
                resting.order_id,
                incoming.id.clone(),
                resting.user_id,
                incoming.user_id.clone(),
            ),
        };
        fills.push(Fill {
            buy_order_id,
            sell_order_id,
            buy_user_id,
            sell_user_id,
            quantity: fill_quantity,
            price: taker_price,
        });
    }

    fills
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Position detail on a leaderboard entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionDetail {
    pub symbol: Symbol,
    pub quantity: Quantity,
    pub average_price: Price,
    pub current_price: Price,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: UserId,
    pub net_worth: f64,
    pub cash_balance: f64,
    pub realized_pnl: f64,
    pub portfolio_value: f64,
    pub positions: Vec<PositionDetail>,
}

/// Users ranked by net worth, descending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardSnapshot {
    pub total_users: usize,
    pub entries: Vec<LeaderboardEntry>,
}

/// Copy of one user's portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSnapshot {
    pub user_id: UserId,
    pub cash_balance: Decimal,
    pub realized_pnl: Decimal,
    pub positions: BTreeMap<Symbol, Position>,
}

/// Thread-safe facade over the engine: one writer (the bus consumer),
/// snapshot-copying readers (the HTTP surface).
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<RwLock<MatchingEngine>>,
}

impl EngineHandle {
    pub fn new(engine: MatchingEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn submit_order(&self, order: Order) -> Result<SubmitOutcome, EngineError> {
        self.inner.write().submit_order(order)
    }

    pub fn set_trade_callback(&self, callback: TradeCallback) {
        self.inner.write().set_trade_callback(callback);
    }

    pub fn book_snapshot(&self, symbol: &Symbol) -> Option<BookSnapshot> {
        self.inner.read().book_snapshot(symbol)
    }

    pub fn leaderboard(&self) -> LeaderboardSnapshot {
        self.inner.read().leaderboard()
    }

    pub fn user_snapshot(&self, user_id: &UserId) -> Option<UserSnapshot> {
        self.inner.read().user_snapshot(user_id)
    }

    /// Resting order lookup (copy), for tests and diagnostics.
    pub fn find_order(&self, symbol: &Symbol, order_id: &OrderId) -> Option<Order> {
        let guard = self.inner.read();
        guard.book(symbol)?.find_order(order_id).cloned()
    }

    /// Credit cash to a user, creating the user on first reference.
    pub fn deposit(&self, user_id: &UserId, amount: Decimal) -> Result<(), PortfolioError> {
        self.inner.write().get_or_create_user(user_id).deposit(amount)
    }

    /// `(total_trades, total_volume)` counters.
    pub fn totals(&self) -> (u64, Decimal) {
        let guard = self.inner.read();
        (guard.total_trades(), guard.total_volume())
    }
}
