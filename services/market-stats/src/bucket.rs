//! OHLCV buckets and per-instrument statistics
//!
//! Each timeframe keeps exactly one bucket: the current period. Crossing a
//! UTC boundary resets the bucket in place; the pre-reset close still
//! seeds the first simple return of the fresh period, so returns are
//! continuous across the roll.
//!
//! Volatility is an EWMA of squared trade-to-trade returns
//! (`v² = α·r² + (1−α)·v²`, `α = 0.1`), bootstrapped from `r²` when there
//! is no prior variance, and published as the square root.

use crate::timeframe::Timeframe;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::Serialize;
use std::collections::BTreeMap;
use types::ids::Symbol;
use types::numeric::{Price, Quantity};

/// Smoothing parameter of the volatility EWMA.
const EWMA_ALPHA: f64 = 0.1;

/// One OHLCV bucket: the current period of one timeframe.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OhlcvBucket {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Quantity,
    pub dollar_volume: Decimal,
    pub simple_return: f64,
    pub volatility: f64,
    pub trade_count: u64,
    /// Bucket start, epoch seconds. Meaningless while `trade_count == 0`.
    start_ts: i64,
    /// Running EWMA variance backing `volatility`.
    ewma_variance: f64,
}

impl OhlcvBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.trade_count == 0
    }

    /// Bucket start in epoch seconds (while non-empty).
    pub fn start_ts(&self) -> i64 {
        self.start_ts
    }

    /// Volume-weighted average price; zero while there is no volume.
    pub fn vwap(&self) -> Decimal {
        if self.volume.is_zero() {
            Decimal::ZERO
        } else {
            self.dollar_volume / self.volume.as_decimal()
        }
    }

    /// Fold one trade into the bucket for the period starting at
    /// `bucket_start`, resetting first if the period rolled over.
    ///
    /// Returns the close the return calculation should compare against:
    /// the previous close within the period, or the final close of the
    /// period that just ended, or zero when there is no history at all.
    pub fn fold(&mut self, price: Price, quantity: Quantity, bucket_start: i64) -> Price {
        let previous_close = if self.is_empty() { Price::ZERO } else { self.close };

        if !self.is_empty() && self.start_ts != bucket_start {
            *self = Self::default();
        }

        if self.is_empty() {
            self.open = price;
            self.high = price;
            self.low = price;
            self.close = price;
            self.volume = quantity;
            self.dollar_volume = price * quantity;
            self.trade_count = 1;
            self.start_ts = bucket_start;
        } else {
            self.high = self.high.max(price);
            self.low = self.low.min(price);
            self.close = price;
            self.volume += quantity;
            self.dollar_volume += price * quantity;
            self.trade_count += 1;
        }

        previous_close
    }

    /// Simple return of the current close against `previous_close`.
    pub fn set_simple_return(&mut self, previous_close: Price) {
        let prev = previous_close.as_decimal();
        if prev > Decimal::ZERO {
            self.simple_return = ((self.close.as_decimal() - prev) / prev)
                .to_f64()
                .unwrap_or(0.0);
        }
    }

    /// Fold one trade-to-trade return into the EWMA variance.
    pub fn update_volatility(&mut self, trade_return: f64) {
        let squared = trade_return * trade_return;
        self.ewma_variance = if self.ewma_variance > 0.0 {
            EWMA_ALPHA * squared + (1.0 - EWMA_ALPHA) * self.ewma_variance
        } else {
            squared
        };
        self.volatility = self.ewma_variance.sqrt();
    }
}

impl Serialize for OhlcvBucket {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("OhlcvBucket", 10)?;
        state.serialize_field("open", &self.open)?;
        state.serialize_field("high", &self.high)?;
        state.serialize_field("low", &self.low)?;
        state.serialize_field("close", &self.close)?;
        state.serialize_field("volume", &self.volume)?;
        state.serialize_field("dollar_volume", &self.dollar_volume.to_f64().unwrap_or(0.0))?;
        state.serialize_field("simple_return", &self.simple_return)?;
        state.serialize_field("volatility", &self.volatility)?;
        state.serialize_field("trade_count", &self.trade_count)?;
        state.serialize_field("vwap", &self.vwap().to_f64().unwrap_or(0.0))?;
        state.end()
    }
}

/// All statistics for one symbol: the last trade price plus the current
/// bucket of every configured timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct InstrumentStats {
    pub symbol: String,
    pub last_trade_price: Price,
    pub timeframes: BTreeMap<Timeframe, OhlcvBucket>,
}

impl InstrumentStats {
    pub fn new(symbol: &Symbol) -> Self {
        Self {
            symbol: symbol.as_str().to_string(),
            last_trade_price: Price::ZERO,
            timeframes: BTreeMap::new(),
        }
    }

    /// Fold one trade into every configured timeframe.
    pub fn apply_trade(
        &mut self,
        timeframes: &[Timeframe],
        price: Price,
        quantity: Quantity,
        timestamp_ms: i64,
    ) {
        let previous_price = self.last_trade_price;

        for &tf in timeframes {
            let bucket_start = tf.align_ms(timestamp_ms);
            let bucket = self.timeframes.entry(tf).or_default();

            let previous_close = bucket.fold(price, quantity, bucket_start);
            if !previous_close.is_zero() {
                bucket.set_simple_return(previous_close);
            }
            if !previous_price.is_zero() {
                let prev = previous_price.to_f64();
                let trade_return = (price.to_f64() - prev) / prev;
                bucket.update_volatility(trade_return);
            }
        }

        self.last_trade_price = price;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE_MS: i64 = 60_000;

    fn price(p: u64) -> Price {
        Price::from_u64(p)
    }

    fn qty(q: u64) -> Quantity {
        Quantity::from_u64(q)
    }

    fn stats() -> InstrumentStats {
        InstrumentStats::new(&Symbol::new("AAPL"))
    }

    #[test]
    fn test_single_minute_fold() {
        // Trades within one minute: (price 100, qty 50), (110, 25), (95, 100).
        let mut stats = stats();
        let tfs = [Timeframe::M1];
        let base = 1_700_000_040_000; // minute-aligned
        stats.apply_trade(&tfs, price(100), qty(50), base + 1_000);
        stats.apply_trade(&tfs, price(110), qty(25), base + 10_000);
        stats.apply_trade(&tfs, price(95), qty(100), base + 30_000);

        let bucket = &stats.timeframes[&Timeframe::M1];
        assert_eq!(bucket.open, price(100));
        assert_eq!(bucket.high, price(110));
        assert_eq!(bucket.low, price(95));
        assert_eq!(bucket.close, price(95));
        assert_eq!(bucket.volume, qty(175));
        assert_eq!(bucket.dollar_volume, Decimal::from(17_250));
        assert_eq!(bucket.trade_count, 3);

        let vwap = bucket.vwap().to_f64().unwrap();
        assert!((vwap - 98.5714).abs() < 1e-3);
        assert_eq!(stats.last_trade_price, price(95));
    }

    #[test]
    fn test_vwap_identity() {
        let mut bucket = OhlcvBucket::new();
        bucket.fold(price(100), qty(50), 0);
        bucket.fold(price(110), qty(25), 0);
        assert_eq!(
            bucket.vwap() * bucket.volume.as_decimal(),
            bucket.dollar_volume
        );
    }

    #[test]
    fn test_ohlc_bounds_hold() {
        let mut bucket = OhlcvBucket::new();
        for (p, q) in [(100u64, 10u64), (120, 5), (80, 7), (105, 3)] {
            bucket.fold(price(p), qty(q), 0);
            assert!(bucket.low <= bucket.open && bucket.open <= bucket.high);
            assert!(bucket.low <= bucket.close && bucket.close <= bucket.high);
        }
    }

    #[test]
    fn test_simple_return_within_bucket() {
        let mut stats = stats();
        let tfs = [Timeframe::M1];
        stats.apply_trade(&tfs, price(100), qty(1), 0);
        stats.apply_trade(&tfs, price(110), qty(1), 1_000);

        let bucket = &stats.timeframes[&Timeframe::M1];
        assert!((bucket.simple_return - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_rollover_resets_bucket_and_carries_return() {
        let mut stats = stats();
        let tfs = [Timeframe::M1];
        stats.apply_trade(&tfs, price(100), qty(10), 0);
        stats.apply_trade(&tfs, price(104), qty(5), 30_000);

        // Next minute: fresh bucket, return seeded from close 104.
        stats.apply_trade(&tfs, price(130), qty(2), MINUTE_MS + 1_000);

        let bucket = &stats.timeframes[&Timeframe::M1];
        assert_eq!(bucket.open, price(130));
        assert_eq!(bucket.trade_count, 1);
        assert_eq!(bucket.volume, qty(2));
        assert_eq!(bucket.start_ts(), 60);
        assert!((bucket.simple_return - (130.0 - 104.0) / 104.0).abs() < 1e-12);
    }

    #[test]
    fn test_volatility_bootstrap_and_ewma() {
        let mut stats = stats();
        let tfs = [Timeframe::M1];
        stats.apply_trade(&tfs, price(100), qty(1), 0);
        // First return: no prior price on the very first trade, so no
        // volatility yet.
        assert_eq!(stats.timeframes[&Timeframe::M1].volatility, 0.0);

        // r = 0.10, bootstrap: v² = r², v = 0.10
        stats.apply_trade(&tfs, price(110), qty(1), 1_000);
        let v1 = stats.timeframes[&Timeframe::M1].volatility;
        assert!((v1 - 0.10).abs() < 1e-12);

        // r = -110/… second update: r = (99 - 110)/110 = -0.1, v² = 0.1·r² + 0.9·0.01
        stats.apply_trade(&tfs, price(99), qty(1), 2_000);
        let r: f64 = (99.0 - 110.0) / 110.0;
        let expected = (0.1 * r * r + 0.9 * 0.01f64).sqrt();
        let v2 = stats.timeframes[&Timeframe::M1].volatility;
        assert!((v2 - expected).abs() < 1e-12);
    }

    #[test]
    fn test_multiple_timeframes_fold_independently() {
        let mut stats = stats();
        let tfs = [Timeframe::M1, Timeframe::H1, Timeframe::D1];
        stats.apply_trade(&tfs, price(100), qty(10), 0);
        stats.apply_trade(&tfs, price(105), qty(10), MINUTE_MS + 1_000);

        // The minute rolled; hour and day did not.
        assert_eq!(stats.timeframes[&Timeframe::M1].trade_count, 1);
        assert_eq!(stats.timeframes[&Timeframe::H1].trade_count, 2);
        assert_eq!(stats.timeframes[&Timeframe::D1].trade_count, 2);
        assert_eq!(stats.timeframes[&Timeframe::H1].volume, qty(20));
    }

    #[test]
    fn test_bucket_serializes_with_vwap() {
        let mut bucket = OhlcvBucket::new();
        bucket.fold(price(100), qty(50), 0);
        bucket.fold(price(110), qty(25), 0);

        let json = serde_json::to_value(&bucket).unwrap();
        assert_eq!(json["open"], 100.0);
        assert_eq!(json["high"], 110.0);
        assert_eq!(json["volume"], 75.0);
        assert_eq!(json["trade_count"], 2);
        assert_eq!(json["dollar_volume"], 7750.0);
        let vwap = json["vwap"].as_f64().unwrap();
        assert!((vwap - 7750.0 / 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_instrument_stats_serializes_timeframe_labels() {
        let mut stats = stats();
        stats.apply_trade(&[Timeframe::M1, Timeframe::H1], price(100), qty(1), 0);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["symbol"], "AAPL");
        assert_eq!(json["last_trade_price"], 100.0);
        assert!(json["timeframes"]["1m"].is_object());
        assert!(json["timeframes"]["1h"].is_object());
    }
}
