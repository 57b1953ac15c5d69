//! Concurrency primitives for the trading engine
//!
//! - [`BoundedQueue`]: fixed-capacity multi-producer single-consumer queue
//!   built on per-cell sequence counters
//! - [`ThreadPool`]: fixed worker pool with a shared FIFO task queue

#![forbid(unsafe_code)]

pub mod pool;
pub mod queue;

pub use pool::{PoolError, ThreadPool};
pub use queue::{BoundedQueue, QueueError, QueueFull};
