//! Console and file logging for the processing pipeline.
//!
//! Two sinks with different thresholds: the console (stderr) shows Info and
//! above, the log file records Debug and above. Line format:
//!
//! ```text
//! 2026-08-08 10:00:00.123 - rowmill - INFO - Read 5 rows
//! ```
//!
//! The logger is a process-wide singleton. File logging is off until
//! [`init_file_logging`] is called; a failed file write degrades to
//! console-only rather than aborting the run.

use chrono::Local;
use once_cell::sync::Lazy;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    /// Label used in formatted log lines.
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// A single log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn debug(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Debug, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into() }
    }
}

/// Global logger instance.
pub static LOGGER: Lazy<Logger> = Lazy::new(Logger::new);

/// Writes log entries to stderr and, once attached, a log file.
pub struct Logger {
    file: Mutex<Option<std::fs::File>>,
}

impl Logger {
    pub fn new() -> Self {
        Self { file: Mutex::new(None) }
    }

    /// Attach a log file. The parent directory is created if needed and
    /// entries are appended to any existing file.
    pub fn attach_file(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        if let Ok(mut guard) = self.file.lock() {
            *guard = Some(file);
        }
        Ok(())
    }

    /// Write an entry to both sinks, honoring each sink's threshold.
    pub fn log(&self, entry: LogEntry) {
        let line = format_line(&entry);

        // Console: Info and above
        if entry.level >= LogLevel::Info {
            eprintln!("{}", line);
        }

        // File: everything, including Debug
        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = writeln!(file, "{}", line);
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Format an entry as a log line with a local timestamp.
fn format_line(entry: &LogEntry) -> String {
    format!(
        "{} - rowmill - {} - {}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        entry.level.label(),
        entry.message
    )
}

/// Attach the global logger to a file.
pub fn init_file_logging(path: &Path) -> std::io::Result<()> {
    LOGGER.attach_file(path)
}

/// Convenient logging functions
pub fn log_debug(msg: impl Into<String>) {
    LOGGER.log(LogEntry::debug(msg));
}

pub fn log_info(msg: impl Into<String>) {
    LOGGER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOGGER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOGGER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOGGER.log(LogEntry::error(msg));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Success);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_line_format() {
        let line = format_line(&LogEntry::info("Read 5 rows"));
        assert!(line.contains(" - rowmill - INFO - Read 5 rows"));
    }

    #[test]
    fn test_file_sink_records_debug() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("logs").join("run.log");

        let logger = Logger::new();
        logger.attach_file(&log_path).unwrap();
        logger.log(LogEntry::debug("starting transformations"));
        logger.log(LogEntry::error("something failed"));

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("DEBUG - starting transformations"));
        assert!(content.contains("ERROR - something failed"));
    }

    #[test]
    fn test_append_on_reattach() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("run.log");

        let logger = Logger::new();
        logger.attach_file(&log_path).unwrap();
        logger.log(LogEntry::info("first run"));

        let logger2 = Logger::new();
        logger2.attach_file(&log_path).unwrap();
        logger2.log(LogEntry::info("second run"));

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("first run"));
        assert!(content.contains("second run"));
    }
}
