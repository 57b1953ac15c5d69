//! Statistics collector
//!
//! Producers submit trade events with a non-blocking enqueue; a single
//! collector thread drains the queue and folds events into the shared
//! stats map under a write lock. Reads copy out under the shared lock and
//! never block the writer for longer than the copy.

use crate::bucket::InstrumentStats;
use crate::timeframe::Timeframe;
use concurrent::{BoundedQueue, QueueError};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use types::ids::Symbol;
use types::numeric::{Price, Quantity};
use types::trade::Trade;

/// Evict buckets untouched for this long during periodic cleanup.
const STALE_BUCKET_AGE: Duration = Duration::from_secs(7 * 24 * 3600);

/// Collector configuration.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    pub enabled: bool,
    pub queue_capacity: usize,
    pub cleanup_interval: Duration,
    pub timeframes: Vec<Timeframe>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: 10_000,
            cleanup_interval: Duration::from_secs(3600),
            timeframes: Timeframe::defaults(),
        }
    }
}

/// The slice of a trade the statistics need.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub symbol: Symbol,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp_ms: i64,
}

impl From<&Trade> for TradeEvent {
    fn from(trade: &Trade) -> Self {
        Self {
            symbol: trade.symbol.clone(),
            price: trade.price,
            quantity: trade.quantity,
            timestamp_ms: trade.timestamp_ms,
        }
    }
}

struct Inner {
    config: StatsConfig,
    queue: BoundedQueue<TradeEvent>,
    stats: RwLock<FxHashMap<Symbol, InstrumentStats>>,
    running: AtomicBool,
    stop_requested: AtomicBool,
    processed: AtomicU64,
    dropped: AtomicU64,
}

/// MPSC intake plus one collector thread over the shared stats map.
pub struct StatsCollector {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl StatsCollector {
    pub fn new(config: StatsConfig) -> Result<Self, QueueError> {
        let queue = BoundedQueue::new(config.queue_capacity)?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                queue,
                stats: RwLock::new(FxHashMap::default()),
                running: AtomicBool::new(false),
                stop_requested: AtomicBool::new(false),
                processed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
            worker: Mutex::new(None),
        })
    }

    pub fn with_defaults() -> Result<Self, QueueError> {
        Self::new(StatsConfig::default())
    }

    /// Spawn the collector thread. Returns false when disabled.
    pub fn start(&self) -> bool {
        if !self.inner.config.enabled {
            return false;
        }
        if self.inner.running.load(Ordering::Acquire) {
            return true;
        }

        self.inner.stop_requested.store(false, Ordering::Release);
        self.inner.running.store(true, Ordering::Release);

        let inner = Arc::clone(&self.inner);
        match thread::Builder::new()
            .name("stats-collector".into())
            .spawn(move || collector_loop(&inner))
        {
            Ok(handle) => {
                *self.worker.lock() = Some(handle);
                info!(
                    queue_capacity = self.inner.queue.capacity(),
                    timeframes = ?self.inner.config.timeframes,
                    "statistics collector started"
                );
                true
            }
            Err(_) => {
                self.inner.running.store(false, Ordering::Release);
                false
            }
        }
    }

    /// Stop the collector. Queued events are drained before this returns.
    pub fn stop(&self) {
        if !self.inner.running.load(Ordering::Acquire) {
            return;
        }
        self.inner.stop_requested.store(true, Ordering::Release);
        self.inner.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Non-blocking submission. False (and a drop count) when the queue
    /// is full or the collector is not running.
    pub fn submit_trade(&self, trade: &Trade) -> bool {
        self.submit_event(TradeEvent::from(trade))
    }

    /// Non-blocking submission of a pre-built event.
    pub fn submit_event(&self, event: TradeEvent) -> bool {
        if !self.inner.config.enabled || !self.is_running() {
            return false;
        }
        match self.inner.queue.try_enqueue(event) {
            Ok(()) => true,
            Err(_) => {
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Snapshot copy of one symbol's statistics.
    pub fn stats_for_symbol(&self, symbol: &Symbol) -> Option<InstrumentStats> {
        self.inner.stats.read().get(symbol).cloned()
    }

    /// Snapshot copy of every symbol's statistics.
    pub fn all_stats(&self) -> FxHashMap<Symbol, InstrumentStats> {
        self.inner.stats.read().clone()
    }

    pub fn queue_size(&self) -> usize {
        self.inner.queue.len()
    }

    pub fn total_trades_processed(&self) -> u64 {
        self.inner.processed.load(Ordering::Relaxed)
    }

    pub fn total_trades_dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for StatsCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn collector_loop(inner: &Inner) {
    let mut last_cleanup = Instant::now();

    while !inner.stop_requested.load(Ordering::Acquire) {
        match inner.queue.try_dequeue() {
            Some(event) => {
                process_event(inner, &event);
                inner.processed.fetch_add(1, Ordering::Relaxed);
            }
            None => thread::sleep(Duration::from_micros(100)),
        }

        if last_cleanup.elapsed() >= inner.config.cleanup_interval {
            cleanup_stale_buckets(inner);
            last_cleanup = Instant::now();
        }
    }

    // Drain whatever arrived before the stop.
    while let Some(event) = inner.queue.try_dequeue() {
        process_event(inner, &event);
        inner.processed.fetch_add(1, Ordering::Relaxed);
    }
}

fn process_event(inner: &Inner, event: &TradeEvent) {
    let mut stats = inner.stats.write();
    stats
        .entry(event.symbol.clone())
        .or_insert_with(|| InstrumentStats::new(&event.symbol))
        .apply_trade(
            &inner.config.timeframes,
            event.price,
            event.quantity,
            event.timestamp_ms,
        );
}

/// Drop buckets whose period started more than a week ago. Keeps the map
/// bounded for symbols that stopped trading.
fn cleanup_stale_buckets(inner: &Inner) {
    let cutoff = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
        - STALE_BUCKET_AGE.as_secs() as i64;

    let mut stats = inner.stats.write();
    let mut evicted = 0usize;
    for instrument in stats.values_mut() {
        let before = instrument.timeframes.len();
        instrument
            .timeframes
            .retain(|_, bucket| bucket.is_empty() || bucket.start_ts() >= cutoff);
        evicted += before - instrument.timeframes.len();
    }
    if evicted > 0 {
        debug!(evicted, "evicted stale statistics buckets");
    }
}
