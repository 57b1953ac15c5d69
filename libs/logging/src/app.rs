//! Application logger
//!
//! Formats `[YYYY-MM-DD HH:MM:SS.mmm] [LEVEL] message` lines, filters by
//! level, mirrors to the console when enabled (INFO/DEBUG to stdout,
//! WARN/ERROR to stderr), and hands the line to an [`AsyncLogSink`] for
//! durable file output.

use crate::level::LogLevel;
use crate::sink::{AsyncLogSink, SinkError};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Level-filtered logger over one async file sink.
pub struct AppLogger {
    sink: AsyncLogSink,
    min_level: RwLock<LogLevel>,
    console_output: AtomicBool,
}

impl AppLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            sink: AsyncLogSink::new(path),
            min_level: RwLock::new(LogLevel::Info),
            console_output: AtomicBool::new(false),
        }
    }

    /// Start the underlying sink.
    pub fn start(&self) -> Result<(), SinkError> {
        self.sink.start()
    }

    /// Stop the underlying sink, flushing queued lines.
    pub fn stop(&self) {
        self.sink.stop();
    }

    /// Drop records below `level`.
    pub fn set_log_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    /// Mirror records to the console in addition to the file.
    pub fn enable_console_output(&self, enable: bool) {
        self.console_output.store(enable, Ordering::Relaxed);
    }

    /// Format, filter, mirror, and enqueue one record.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < *self.min_level.read() {
            return;
        }
        let line = format_entry(level, message);
        if self.console_output.load(Ordering::Relaxed) {
            match level {
                LogLevel::Debug | LogLevel::Info => println!("{line}"),
                LogLevel::Warn | LogLevel::Error => eprintln!("{line}"),
            }
        }
        self.sink.add_log(line);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

fn format_entry(level: LogLevel, message: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
    format!("[{timestamp}] [{level}] {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_format_shape() {
        let line = format_entry(LogLevel::Info, "engine started");
        // [2026-01-01 00:00:00.000] [INFO] engine started
        assert!(line.starts_with('['));
        assert!(line.contains("] [INFO] engine started"));
        let ts = &line[1..line.find(']').unwrap()];
        assert_eq!(ts.len(), "2026-01-01 00:00:00.000".len());
    }

    #[test]
    fn test_level_filtering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let logger = AppLogger::new(&path);
        logger.start().unwrap();
        logger.set_log_level(LogLevel::Warn);

        logger.debug("hidden");
        logger.info("hidden");
        logger.warn("shown");
        logger.error("shown too");
        logger.stop();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[WARN] shown"));
        assert!(lines[1].contains("[ERROR] shown too"));
    }

    #[test]
    fn test_default_level_is_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let logger = AppLogger::new(&path);
        logger.start().unwrap();

        logger.debug("hidden");
        logger.info("shown");
        logger.stop();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[INFO] shown"));
    }
}
