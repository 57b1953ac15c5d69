//! Engine lifecycle
//!
//! `start` brings subsystems up in dependency order: durable log sinks,
//! the HTTP surface, the statistics collector, then the bus connection and
//! the `order-requests` subscription (orders only flow once everything
//! downstream is ready). `stop` reverses it and flushes the sinks last, so
//! every record from the drain ends up on disk.

use crate::config::EngineConfig;
use crate::execution::Executor;
use crate::intake::OrderIntake;
use crate::sinks::TradeSinks;
use anyhow::{bail, Context};
use bus::QueueClient;
use concurrent::ThreadPool;
use gateway::{create_router, AppState};
use logging::{AppLogger, LogLevel, TradeLogger};
use market_stats::StatsCollector;
use matching_engine::{EngineHandle, MatchingEngine};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Top-level engine: owns every subsystem and their lifecycle.
pub struct TradingEngine {
    config: EngineConfig,
    app_logger: Arc<AppLogger>,
    trade_logger: Arc<TradeLogger>,
    engine: EngineHandle,
    stats: Arc<StatsCollector>,
    bus: Arc<QueueClient>,
    executor: Arc<Executor>,
    pool: Arc<ThreadPool>,
    running: Arc<AtomicBool>,
    http_shutdown: Mutex<Option<oneshot::Sender<()>>>,
    http_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl TradingEngine {
    /// Build every subsystem from the configuration. Nothing is started.
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let stats = StatsCollector::new(config.stats_config())
            .context("statistics collector configuration")?;
        let engine = EngineHandle::new(MatchingEngine::new(config.starting_cash()));
        let bus = Arc::new(QueueClient::new(config.redpanda.brokers.clone()));
        let pool = Arc::new(ThreadPool::new(config.http.threads.max(1)));

        Ok(Self {
            app_logger: Arc::new(AppLogger::new(&config.logging.app_log)),
            trade_logger: Arc::new(TradeLogger::new(&config.logging.trade_log)),
            engine,
            stats: Arc::new(stats),
            bus,
            executor: Arc::new(Executor::new()),
            pool,
            running: Arc::new(AtomicBool::new(false)),
            http_shutdown: Mutex::new(None),
            http_task: Mutex::new(None),
            local_addr: Mutex::new(None),
            config,
        })
    }

    /// Start everything, in order: sinks, HTTP, statistics, bus.
    pub async fn start(&self) -> anyhow::Result<()> {
        if self.running.load(Ordering::Acquire) {
            bail!("engine already running");
        }

        self.app_logger.start().context("start application log")?;
        self.trade_logger.start().context("start trade log")?;

        // Execution results land on the trade log.
        {
            let trade_logger = Arc::clone(&self.trade_logger);
            self.executor
                .set_execution_callback(Arc::new(move |result| {
                    trade_logger.log_execution(
                        &result.execution_id,
                        result.symbol.as_str(),
                        result.executed_quantity,
                        result.executed_price,
                        result.status.as_str(),
                    );
                }));
        }

        // Trade fan-out: trade log, statistics, execution pool,
        // confirmation.
        self.engine.set_trade_callback(
            TradeSinks::new(
                Arc::clone(&self.trade_logger),
                Arc::clone(&self.stats),
                Arc::clone(&self.executor),
                Arc::clone(&self.pool),
            )
            .into_callback(),
        );

        // HTTP surface.
        let state = AppState::new(
            Arc::clone(&self.bus),
            self.engine.clone(),
            Arc::clone(&self.stats),
            Arc::clone(&self.running),
        );
        let listener = TcpListener::bind((self.config.http.host.as_str(), self.config.http.port))
            .await
            .with_context(|| {
                format!(
                    "bind HTTP listener on {}:{}",
                    self.config.http.host, self.config.http.port
                )
            })?;
        let addr = listener.local_addr().context("read bound HTTP address")?;
        *self.local_addr.lock() = Some(addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        *self.http_shutdown.lock() = Some(shutdown_tx);
        let server = axum::serve(listener, create_router(state)).with_graceful_shutdown(
            async move {
                let _ = shutdown_rx.await;
            },
        );
        *self.http_task.lock() = Some(tokio::spawn(async move {
            if let Err(err) = server.await {
                error!(%err, "HTTP server terminated");
            }
        }));

        // Statistics collector.
        if self.config.statistics.enabled && !self.stats.start() {
            bail!("failed to start statistics collector");
        }

        // Bus connection and the order subscription.
        self.bus.connect().context("connect ingress bus")?;
        let intake = OrderIntake::new(
            self.engine.clone(),
            self.config.validator(),
            Arc::clone(&self.app_logger),
        );
        self.bus
            .subscribe(bus::ORDER_TOPIC, move |message| {
                intake.process_message(message);
            })
            .context("subscribe to order-requests")?;

        self.running.store(true, Ordering::Release);
        info!(%addr, "trading engine started");
        self.trade_logger
            .log_message(LogLevel::Info, "Trading engine started");
        Ok(())
    }

    /// Stop everything in reverse order and flush the sinks.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(shutdown) = self.http_shutdown.lock().take() {
            let _ = shutdown.send(());
        }
        let task = self.http_task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }

        self.stats.stop();
        self.bus.disconnect();

        // Let queued execution tasks finish so their records land before
        // the sinks flush.
        self.pool.wait_until_idle();

        self.trade_logger
            .log_message(LogLevel::Info, "Trading engine stopped");
        self.trade_logger.stop();
        self.app_logger.stop();
        info!("trading engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Bound HTTP address once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    pub fn engine_handle(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn stats(&self) -> &Arc<StatsCollector> {
        &self.stats
    }

    pub fn bus(&self) -> &Arc<QueueClient> {
        &self.bus
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }
}
