//! Per-symbol OHLCV statistics
//!
//! Trades stream in through a bounded MPSC queue and one collector thread
//! folds them into per-symbol, per-timeframe OHLCV buckets with VWAP,
//! simple return, and an EWMA volatility. Readers take shared locks and
//! copy; the collector thread is the sole writer.

pub mod bucket;
pub mod collector;
pub mod timeframe;

pub use bucket::{InstrumentStats, OhlcvBucket};
pub use collector::{StatsCollector, StatsConfig, TradeEvent};
pub use timeframe::Timeframe;
