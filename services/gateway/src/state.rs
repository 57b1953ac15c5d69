//! Shared application state for the HTTP handlers

use bus::QueueClient;
use market_stats::StatsCollector;
use matching_engine::EngineHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<QueueClient>,
    pub engine: EngineHandle,
    pub stats: Arc<StatsCollector>,
    /// Engine lifecycle flag, reported by `/health`.
    pub running: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        bus: Arc<QueueClient>,
        engine: EngineHandle,
        stats: Arc<StatsCollector>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            bus,
            engine,
            stats,
            running,
        }
    }
}
