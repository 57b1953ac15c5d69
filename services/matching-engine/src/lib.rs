//! Matching engine
//!
//! Price-time priority order matching with per-user portfolio settlement.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced (best price first, FIFO within
//!   a level)
//! - Empty price levels are never visible to readers
//! - Positions never go negative, cash never goes below zero
//! - Trade ids are monotone, starting at 1
//!
//! All engine state is single-writer: mutations arrive on the bus-consumer
//! thread through [`EngineHandle`], readers get snapshot copies.

pub mod book;
pub mod engine;
pub mod matching;
pub mod portfolio;
pub mod validate;

pub use book::{BookError, BookSnapshot, OrderBook};
pub use engine::{EngineError, EngineHandle, MatchingEngine, SubmitOutcome};
pub use portfolio::{PortfolioError, Position, User};
pub use validate::{OrderValidator, ValidationError};
