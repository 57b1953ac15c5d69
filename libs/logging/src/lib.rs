//! Durable file logging for the trading engine
//!
//! Every log file is owned by an [`AsyncLogSink`]: a string queue drained
//! by one writer thread, terminated by a reserved sentinel so that `stop`
//! flushes everything enqueued before it. [`AppLogger`] and [`TradeLogger`]
//! layer level filtering and record formats on top.

pub mod app;
pub mod level;
pub mod sink;
pub mod trade_log;

pub use app::AppLogger;
pub use level::LogLevel;
pub use sink::{AsyncLogSink, SinkError};
pub use trade_log::{TradeConfirmation, TradeLogger};
