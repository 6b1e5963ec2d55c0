//! Pipeline progress logs, printed locally and streamed over SSE.
//!
//! Entries go to stderr (so command output on stdout stays machine-readable)
//! and to every subscriber of the process-wide broadcast channel.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Buffered entries per slow subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth (steps are logged at 1)
    #[serde(default)]
    pub indent: u8,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    fn render(&self) -> String {
        let marker = match self.level {
            LogLevel::Info => " ",
            LogLevel::Success => "✓",
            LogLevel::Warning => "!",
            LogLevel::Error => "✗",
        };
        format!("{}{} {}", "   ".repeat(self.indent as usize), marker, self.message)
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Fans log entries out to all connected SSE clients.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    echo: AtomicBool,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            echo: AtomicBool::new(true),
        }
    }

    pub fn log(&self, entry: LogEntry) {
        if self.echo.load(Ordering::Relaxed) {
            eprintln!("{}", entry.render());
        }
        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Turn stderr printing on or off. Broadcasting is unaffected.
    pub fn set_echo(&self, echo: bool) {
        self.echo.store(echo, Ordering::Relaxed);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::info(msg).with_indent(indent));
}

pub fn log_success_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::success(msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_receive_entries() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.set_echo(false);
        let mut rx = broadcaster.subscribe();

        broadcaster.log(LogEntry::success("step done").with_indent(1));

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.level, LogLevel::Success);
        assert_eq!(entry.message, "step done");
        assert_eq!(entry.indent, 1);
    }

    #[test]
    fn test_log_without_subscribers_does_not_fail() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.set_echo(false);
        broadcaster.log(LogEntry::info("nobody listening"));
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let value = serde_json::to_value(LogEntry::warning("careful")).unwrap();
        assert_eq!(value["level"], "warning");
        assert_eq!(value["message"], "careful");
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn test_render() {
        assert_eq!(LogEntry::error("boom").with_indent(2).render(), "      ✗ boom");
    }
}
