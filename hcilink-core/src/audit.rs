/*!
 * Audit log
 * Append-only, one timestamped line per operation step
 */

use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::AuditConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Error,
}

impl AuditLevel {
    fn as_str(self) -> &'static str {
        match self {
            AuditLevel::Info => "INFO",
            AuditLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: DateTime<Local>,
    pub level: AuditLevel,
    pub message: String,
}

impl AuditEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(AuditLevel::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(AuditLevel::Error, message)
    }

    fn new(level: AuditLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }

    pub fn to_line(&self) -> String {
        // Multi-line tool output stays on one audit line
        let message = self
            .message
            .replace("\r\n", "\n")
            .replace(['\r', '\n'], " | ");
        format!(
            "{} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.level.as_str(),
            message
        )
    }
}

/// Sink for audit entries. Recording never fails from the caller's point of view.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

pub struct NullAuditLog;

impl AuditSink for NullAuditLog {
    fn record(&self, _entry: AuditEntry) {}
}

pub struct FileAuditLog {
    file: Mutex<File>,
}

impl FileAuditLog {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditLog {
    fn record(&self, entry: AuditEntry) {
        let Ok(mut file) = self.file.lock() else {
            tracing::warn!("Audit log lock poisoned, dropping entry: {}", entry.message);
            return;
        };

        let line = entry.to_line();
        if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
            tracing::warn!("Failed to write audit log entry: {}", e);
        }
    }
}

/// Opens the configured sink. An unwritable log file degrades to no audit log.
pub fn open_audit_log(config: &AuditConfig) -> Arc<dyn AuditSink> {
    if !config.enabled {
        return Arc::new(NullAuditLog);
    }

    match FileAuditLog::open(&config.path) {
        Ok(log) => Arc::new(log),
        Err(e) => {
            tracing::warn!("Audit log {} unavailable: {}", config.path.display(), e);
            Arc::new(NullAuditLog)
        }
    }
}

/// Keeps entries in memory; handy for tests and for front ends that show history.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, entry: AuditEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn line_carries_timestamp_level_and_message() {
        let entry = AuditEntry::error("Failed to scan devices: boom\nsecond line");
        let line = entry.to_line();

        let prefix = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        assert!(line.starts_with(&prefix));
        assert!(line.ends_with(" ERROR Failed to scan devices: boom | second line"));
    }

    #[test]
    fn carriage_returns_do_not_split_the_line() {
        let entry = AuditEntry::error("first\r\nsecond\rthird");

        let line = entry.to_line();

        assert!(!line.contains(['\r', '\n']));
        assert!(line.ends_with(" ERROR first | second | third"));
    }

    #[test]
    fn file_log_appends_one_line_per_entry() {
        let path = std::env::temp_dir().join(format!("hcilink-audit-{}.log", std::process::id()));
        let _ = fs::remove_file(&path);

        let log = FileAuditLog::open(&path).unwrap();
        log.record(AuditEntry::info("Bluetooth Manager started"));
        log.record(AuditEntry::info("Scanned for Bluetooth devices"));
        drop(log);

        let reopened = FileAuditLog::open(&path).unwrap();
        reopened.record(AuditEntry::info("Connected to 00:11:22:33:44:55 DeviceA"));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("INFO Bluetooth Manager started"));
        assert!(lines[2].ends_with("INFO Connected to 00:11:22:33:44:55 DeviceA"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn memory_log_keeps_order() {
        let log = MemoryAuditLog::new();
        log.record(AuditEntry::info("first"));
        log.record(AuditEntry::error("second"));

        assert_eq!(log.messages(), ["first", "second"]);
        assert_eq!(log.entries()[1].level, AuditLevel::Error);
    }
}
