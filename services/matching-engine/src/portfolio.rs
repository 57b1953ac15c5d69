//! User portfolios
//!
//! Cash, per-symbol positions, and realized PnL. Executions are applied
//! from one user's perspective at a time; a rejected execution leaves the
//! user completely untouched. No shorting and no overdraft: position
//! quantities and cash stay non-negative through every accepted call.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;
use types::ids::{Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::Side;

/// Rejections from portfolio mutation. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortfolioError {
    #[error("invalid execution arguments")]
    InvalidExecution,
    #[error("invalid cash amount")]
    InvalidAmount,
    #[error("insufficient cash: required {required}, available {available}")]
    InsufficientCash {
        required: Decimal,
        available: Decimal,
    },
    #[error("no position in {0}")]
    NoPosition(Symbol),
    #[error("cannot sell {requested} with only {held} held")]
    Oversell { requested: Quantity, held: Quantity },
}

/// Holding in one symbol.
///
/// A flat position keeps its map entry but resets to zero quantity and
/// zero average price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub quantity: Quantity,
    pub average_price: Price,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }
}

/// One user's cash and positions.
#[derive(Debug, Clone)]
pub struct User {
    user_id: UserId,
    cash_balance: Decimal,
    realized_pnl: Decimal,
    positions: BTreeMap<Symbol, Position>,
}

impl User {
    /// Create a user with the given starting cash.
    ///
    /// # Panics
    /// Panics if `starting_cash` is negative.
    pub fn new(user_id: UserId, starting_cash: Decimal) -> Self {
        assert!(
            starting_cash >= Decimal::ZERO,
            "starting cash must be non-negative"
        );
        Self {
            user_id,
            cash_balance: starting_cash,
            realized_pnl: Decimal::ZERO,
            positions: BTreeMap::new(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn cash_balance(&self) -> Decimal {
        self.cash_balance
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> &BTreeMap<Symbol, Position> {
        &self.positions
    }

    /// Add cash. Rejects non-positive amounts without mutation.
    pub fn deposit(&mut self, amount: Decimal) -> Result<(), PortfolioError> {
        if amount <= Decimal::ZERO {
            return Err(PortfolioError::InvalidAmount);
        }
        self.cash_balance += amount;
        Ok(())
    }

    /// Remove cash. Rejects non-positive or uncovered amounts without
    /// mutation.
    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), PortfolioError> {
        if amount <= Decimal::ZERO {
            return Err(PortfolioError::InvalidAmount);
        }
        if amount > self.cash_balance {
            return Err(PortfolioError::InsufficientCash {
                required: amount,
                available: self.cash_balance,
            });
        }
        self.cash_balance -= amount;
        Ok(())
    }

    /// Apply one fill from this user's perspective.
    ///
    /// BUY deducts `gross + fee` from cash and folds the fill into the
    /// weighted-average position. SELL realizes PnL against the average
    /// price, reduces the position (average unchanged on a partial exit,
    /// reset to zeros when flat), and credits `gross − fee`.
    pub fn apply_execution(
        &mut self,
        side: Side,
        symbol: &Symbol,
        quantity: Quantity,
        price: Price,
        fee: Decimal,
    ) -> Result<(), PortfolioError> {
        if quantity.is_zero() || fee < Decimal::ZERO {
            return Err(PortfolioError::InvalidExecution);
        }

        let gross = quantity * price;

        match side {
            Side::BUY => {
                let total_cost = gross + fee;
                if total_cost > self.cash_balance {
                    return Err(PortfolioError::InsufficientCash {
                        required: total_cost,
                        available: self.cash_balance,
                    });
                }

                let position = self.positions.entry(symbol.clone()).or_default();
                let new_quantity = position.quantity + quantity;
                let previous_cost_basis = position.average_price * position.quantity;
                let new_cost_basis = previous_cost_basis + gross;
                position.quantity = new_quantity;
                position.average_price =
                    Price::new(new_cost_basis / new_quantity.as_decimal());

                self.cash_balance -= total_cost;
                Ok(())
            }
            Side::SELL => {
                let position = self
                    .positions
                    .get_mut(symbol)
                    .ok_or_else(|| PortfolioError::NoPosition(symbol.clone()))?;
                if quantity > position.quantity {
                    return Err(PortfolioError::Oversell {
                        requested: quantity,
                        held: position.quantity,
                    });
                }

                let cost_basis_of_sold = position.average_price * quantity;
                let proceeds = gross - fee;
                self.realized_pnl += proceeds - cost_basis_of_sold;

                position.quantity -= quantity;
                if position.is_flat() {
                    *position = Position::default();
                }

                self.cash_balance += proceeds;
                Ok(())
            }
        }
    }
}
