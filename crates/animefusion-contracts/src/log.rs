use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::events::{EventPayload, EventWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Session-scoped, append-only record of what the studio did.
///
/// Entries live in memory only. An optional [`EventWriter`] journal mirrors
/// every entry as a JSONL line for later triage.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Vec<LogEntry>,
    journal: Option<EventWriter>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: EventWriter) -> Self {
        Self {
            entries: Vec::new(),
            journal: Some(journal),
        }
    }

    pub fn append(
        &mut self,
        message: impl Into<String>,
        level: LogLevel,
        details: Option<String>,
    ) -> &LogEntry {
        let entry = LogEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            message: message.into(),
            level,
            details,
        };
        self.mirror("log_entry", &entry);
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn info(&mut self, message: impl Into<String>) -> &LogEntry {
        self.append(message, LogLevel::Info, None)
    }

    pub fn success(&mut self, message: impl Into<String>) -> &LogEntry {
        self.append(message, LogLevel::Success, None)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> &LogEntry {
        self.append(message, LogLevel::Warning, None)
    }

    pub fn error(&mut self, message: impl Into<String>, details: Option<String>) -> &LogEntry {
        self.append(message, LogLevel::Error, details)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Some(journal) = &self.journal {
            if journal.emit("log_cleared", EventPayload::new()).is_err() {
                self.journal = None;
            }
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_level(&self, level: LogLevel) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }

    fn mirror(&mut self, event_type: &str, entry: &LogEntry) {
        let Some(journal) = &self.journal else {
            return;
        };
        let payload = match serde_json::to_value(entry) {
            Ok(Value::Object(map)) => map,
            _ => EventPayload::new(),
        };
        if let Err(err) = journal.emit(event_type, payload) {
            self.journal = None;
            self.entries.push(LogEntry {
                id: Uuid::new_v4().to_string(),
                timestamp: Utc::now(),
                message: "Diagnostic journal disabled after a write failure.".to_string(),
                level: LogLevel::Warning,
                details: Some(format!("{err:#}")),
            });
        }
    }
}

/// Convenience for callers that want a JSON view of the whole log.
pub fn entries_to_json(entries: &[LogEntry]) -> Value {
    json!(entries)
}
