//! Request handlers

pub mod book;
pub mod leaderboard;
pub mod order;
pub mod stats;

use std::time::{SystemTime, UNIX_EPOCH};

/// Epoch seconds, stamped on read responses.
pub(crate) fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
