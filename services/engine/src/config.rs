//! Engine configuration
//!
//! A JSON file with per-subsystem sections; every key has a default so a
//! sparse (or empty `{}`) file works. Unknown timeframe labels are logged
//! and skipped rather than failing startup.

use market_stats::{StatsConfig, Timeframe};
use matching_engine::OrderValidator;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use types::numeric::{Price, Quantity};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub redpanda: RedpandaConfig,
    #[serde(default)]
    pub statistics: StatisticsConfig,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Statistics collector configuration with parsed timeframes.
    pub fn stats_config(&self) -> StatsConfig {
        let mut timeframes = Vec::new();
        for label in &self.statistics.timeframes {
            match Timeframe::from_label(label) {
                Some(tf) => timeframes.push(tf),
                None => warn!(%label, "unknown statistics timeframe, skipping"),
            }
        }
        if timeframes.is_empty() {
            timeframes = Timeframe::defaults();
        }
        StatsConfig {
            enabled: self.statistics.enabled,
            queue_capacity: self.statistics.queue_capacity,
            cleanup_interval: Duration::from_secs(self.statistics.cleanup_interval),
            timeframes,
        }
    }

    /// Validator configured from the validation section.
    pub fn validator(&self) -> OrderValidator {
        let mut validator = OrderValidator::new();
        for symbol in &self.validation.symbols {
            validator.add_valid_symbol(symbol.clone());
        }
        if let Some(q) = Quantity::try_new_f64(self.validation.min_quantity) {
            validator.set_min_quantity(q);
        }
        if let Some(q) = Quantity::try_new_f64(self.validation.max_quantity) {
            validator.set_max_quantity(q);
        }
        if let Some(p) = Price::try_new_f64(self.validation.min_price) {
            validator.set_min_price(p);
        }
        if let Some(p) = Price::try_new_f64(self.validation.max_price) {
            validator.set_max_price(p);
        }
        validator.set_market_open(self.validation.market_open);
        validator
    }

    /// Cash granted to lazily created users.
    pub fn starting_cash(&self) -> Decimal {
        Decimal::from_f64(self.engine.starting_cash)
            .filter(|cash| *cash >= Decimal::ZERO)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            threads: default_threads(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedpandaConfig {
    #[serde(default = "default_brokers")]
    pub brokers: String,
}

impl Default for RedpandaConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatisticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Seconds between stale-bucket cleanup passes.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<String>,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: default_queue_capacity(),
            cleanup_interval: default_cleanup_interval(),
            timeframes: default_timeframes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    #[serde(default)]
    pub starting_cash: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self { starting_cash: 0.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default = "default_min_quantity")]
    pub min_quantity: f64,
    #[serde(default = "default_max_quantity")]
    pub max_quantity: f64,
    #[serde(default = "default_min_price")]
    pub min_price: f64,
    #[serde(default = "default_max_price")]
    pub max_price: f64,
    #[serde(default = "default_true")]
    pub market_open: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            min_quantity: default_min_quantity(),
            max_quantity: default_max_quantity(),
            min_price: default_min_price(),
            max_price: default_max_price(),
            market_open: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_app_log")]
    pub app_log: String,
    #[serde(default = "default_trade_log")]
    pub trade_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_log: default_app_log(),
            trade_log: default_trade_log(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_threads() -> usize {
    4
}

fn default_brokers() -> String {
    "localhost:9092".to_string()
}

fn default_true() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    10_000
}

fn default_cleanup_interval() -> u64 {
    3600
}

fn default_timeframes() -> Vec<String> {
    vec!["1m".to_string(), "1h".to_string(), "1d".to_string()]
}

fn default_min_quantity() -> f64 {
    0.01
}

fn default_max_quantity() -> f64 {
    1_000_000.0
}

fn default_min_price() -> f64 {
    0.01
}

fn default_max_price() -> f64 {
    1_000_000.0
}

fn default_app_log() -> String {
    "app.log".to_string()
}

fn default_trade_log() -> String {
    "trading_engine.log".to_string()
}
