//! Leveled pipeline logs.
//!
//! Entries are printed (warnings and errors on stderr) and published on a
//! process-wide broadcast channel. A [`LogWatch`] reads that channel back;
//! the batch runner uses one per job to attach warnings to its report.

use once_cell::sync::Lazy;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Entries a watcher may fall behind by before older ones are dropped
const CHANNEL_CAPACITY: usize = 256;

static LOG_CHANNEL: Lazy<broadcast::Sender<LogEntry>> =
    Lazy::new(|| broadcast::channel(CHANNEL_CAPACITY).0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn marker(self) -> &'static str {
        match self {
            LogLevel::Info => " ",
            LogLevel::Success => "✓",
            LogLevel::Warning => "⚠",
            LogLevel::Error => "✗",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth; job-scoped details sit one level in
    pub indent: u8,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
        }
    }

    pub fn indented(self, indent: u8) -> Self {
        Self { indent, ..self }
    }

    /// Console line for this entry.
    pub fn render(&self) -> String {
        format!(
            "{}   {} {}",
            "   ".repeat(usize::from(self.indent)),
            self.level.marker(),
            self.message
        )
    }
}

/// Print `entry` and publish it to every open [`LogWatch`].
pub fn emit(entry: LogEntry) {
    match entry.level {
        LogLevel::Warning | LogLevel::Error => eprintln!("{}", entry.render()),
        LogLevel::Info | LogLevel::Success => println!("{}", entry.render()),
    }
    // Nobody watching is the common case
    let _ = LOG_CHANNEL.send(entry);
}

/// Start collecting entries emitted from now on.
pub fn watch() -> LogWatch {
    LogWatch {
        rx: LOG_CHANNEL.subscribe(),
    }
}

/// Reader over the log channel.
pub struct LogWatch {
    rx: broadcast::Receiver<LogEntry>,
}

impl LogWatch {
    /// Entries emitted since the watch opened or was last drained.
    ///
    /// Entries lost to a full channel are skipped.
    pub fn drain(&mut self) -> Vec<LogEntry> {
        let mut entries = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(entry) => entries.push(entry),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        entries
    }

    /// Messages of the drained warning entries.
    pub fn drain_warnings(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .filter(|e| e.level == LogLevel::Warning)
            .map(|e| e.message)
            .collect()
    }
}

pub fn log_info(msg: impl Into<String>) {
    emit(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    emit(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    emit(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    emit(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    emit(LogEntry::new(LogLevel::Info, msg).indented(indent));
}
