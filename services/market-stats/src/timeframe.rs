//! Statistics timeframes
//!
//! Bucket boundaries align to UTC: minutes to the start of the minute,
//! five-minute buckets to `minute - minute % 5`, hours to the hour, days
//! to midnight. Alignment is plain integer arithmetic on epoch seconds,
//! which is UTC by definition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported bucket widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    /// 1 minute
    M1,
    /// 5 minutes
    M5,
    /// 1 hour
    H1,
    /// 1 day
    D1,
}

impl Timeframe {
    /// Wire/config label.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::H1 => "1h",
            Timeframe::D1 => "1d",
        }
    }

    /// Parse a config label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "1m" => Some(Timeframe::M1),
            "5m" => Some(Timeframe::M5),
            "1h" => Some(Timeframe::H1),
            "1d" => Some(Timeframe::D1),
            _ => None,
        }
    }

    /// Bucket width in seconds.
    pub fn duration_secs(&self) -> i64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 5 * 60,
            Timeframe::H1 => 3600,
            Timeframe::D1 => 86_400,
        }
    }

    /// Floor a millisecond timestamp to this timeframe's UTC bucket start
    /// (in epoch seconds).
    pub fn align_ms(&self, timestamp_ms: i64) -> i64 {
        let secs = timestamp_ms.div_euclid(1000);
        secs - secs.rem_euclid(self.duration_secs())
    }

    /// The default configured set.
    pub fn defaults() -> Vec<Timeframe> {
        vec![Timeframe::M1, Timeframe::H1, Timeframe::D1]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Timeframe {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Timeframe {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Timeframe::from_label(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown timeframe: {label}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_labels_roundtrip() {
        for tf in [Timeframe::M1, Timeframe::M5, Timeframe::H1, Timeframe::D1] {
            assert_eq!(Timeframe::from_label(tf.label()), Some(tf));
        }
        assert_eq!(Timeframe::from_label("2h"), None);
    }

    #[test]
    fn test_minute_alignment() {
        let ts = ms(2026, 8, 2, 14, 37, 42) + 250;
        assert_eq!(Timeframe::M1.align_ms(ts), ms(2026, 8, 2, 14, 37, 0) / 1000);
    }

    #[test]
    fn test_five_minute_alignment() {
        let ts = ms(2026, 8, 2, 14, 37, 42);
        assert_eq!(Timeframe::M5.align_ms(ts), ms(2026, 8, 2, 14, 35, 0) / 1000);
    }

    #[test]
    fn test_hour_alignment() {
        let ts = ms(2026, 8, 2, 14, 37, 42);
        assert_eq!(Timeframe::H1.align_ms(ts), ms(2026, 8, 2, 14, 0, 0) / 1000);
    }

    #[test]
    fn test_day_aligns_to_utc_midnight() {
        let ts = ms(2026, 8, 2, 14, 37, 42);
        assert_eq!(Timeframe::D1.align_ms(ts), ms(2026, 8, 2, 0, 0, 0) / 1000);
    }

    #[test]
    fn test_adjacent_minutes_differ() {
        let a = Timeframe::M1.align_ms(ms(2026, 8, 2, 14, 37, 59) + 999);
        let b = Timeframe::M1.align_ms(ms(2026, 8, 2, 14, 38, 0));
        assert_eq!(b - a, 60);
    }

    #[test]
    fn test_serde_as_label() {
        assert_eq!(serde_json::to_string(&Timeframe::M5).unwrap(), "\"5m\"");
        let tf: Timeframe = serde_json::from_str("\"1d\"").unwrap();
        assert_eq!(tf, Timeframe::D1);
    }
}
