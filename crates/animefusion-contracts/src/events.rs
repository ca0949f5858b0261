use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

/// JSONL journal shared by everything that logs during one session.
///
/// Each line carries `type`, `session_id`, `seq` and `ts`; payload keys are
/// written after those and win on collision. The file is opened on the
/// first event and kept open for the rest of the session.
#[derive(Debug, Clone)]
pub struct EventWriter {
    shared: Arc<Journal>,
}

#[derive(Debug)]
struct Journal {
    path: PathBuf,
    session_id: String,
    state: Mutex<JournalState>,
}

#[derive(Debug, Default)]
struct JournalState {
    file: Option<File>,
    next_seq: u64,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Journal {
                path: path.into(),
                session_id: session_id.into(),
                state: Mutex::new(JournalState::default()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn session_id(&self) -> &str {
        &self.shared.session_id
    }

    /// Appends one event and returns the object that was written.
    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut state = self
            .shared
            .state
            .lock()
            .map_err(|_| anyhow!("journal lock poisoned"))?;

        let mut event = Map::new();
        event.insert("type".to_string(), Value::from(event_type));
        event.insert(
            "session_id".to_string(),
            Value::from(self.shared.session_id.as_str()),
        );
        event.insert("seq".to_string(), Value::from(state.next_seq));
        event.insert(
            "ts".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        event.extend(payload);

        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        if state.file.is_none() {
            state.file = Some(self.open_for_append()?);
        }
        if let Some(file) = state.file.as_mut() {
            file.write_all(line.as_bytes())
                .with_context(|| format!("failed to append to {}", self.shared.path.display()))?;
        }
        state.next_seq += 1;

        Ok(Value::Object(event))
    }

    fn open_for_append(&self) -> anyhow::Result<File> {
        let path = &self.shared.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open journal {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn read_lines(path: &Path) -> anyhow::Result<Vec<Value>> {
        fs::read_to_string(path)?
            .lines()
            .map(|line| Ok(serde_json::from_str::<Value>(line)?))
            .collect()
    }

    #[test]
    fn emit_writes_one_compact_line_per_event() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("journal.jsonl");
        let writer = EventWriter::new(&path, "session-1");

        let mut payload = EventPayload::new();
        payload.insert("message".to_string(), Value::from("hello"));
        let emitted = writer.emit("log_entry", payload)?;

        let lines = read_lines(&path)?;
        assert_eq!(lines, vec![emitted]);
        assert_eq!(lines[0]["type"], "log_entry");
        assert_eq!(lines[0]["session_id"], "session-1");
        assert_eq!(lines[0]["seq"], 0);
        assert_eq!(lines[0]["message"], "hello");
        DateTime::parse_from_rfc3339(lines[0]["ts"].as_str().unwrap_or(""))?;
        Ok(())
    }

    #[test]
    fn clones_share_the_sequence() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested/dir/journal.jsonl");
        let writer = EventWriter::new(&path, "session-1");
        let other = writer.clone();

        writer.emit("one", EventPayload::new())?;
        other.emit("two", EventPayload::new())?;
        writer.emit("three", EventPayload::new())?;

        let seqs: Vec<(String, u64)> = read_lines(&path)?
            .iter()
            .map(|event| {
                (
                    event["type"].as_str().unwrap_or_default().to_string(),
                    event["seq"].as_u64().unwrap_or(u64::MAX),
                )
            })
            .collect();
        assert_eq!(
            seqs,
            vec![
                ("one".to_string(), 0),
                ("two".to_string(), 1),
                ("three".to_string(), 2)
            ]
        );
        Ok(())
    }

    #[test]
    fn payload_keys_win_over_defaults() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::new(temp.path().join("journal.jsonl"), "session-1");

        let mut payload = EventPayload::new();
        payload.insert("ts".to_string(), Value::from("fixed"));
        let emitted = writer.emit("log_entry", payload)?;
        assert_eq!(emitted["ts"], "fixed");
        Ok(())
    }

    #[test]
    fn unwritable_path_is_an_error() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        // A directory cannot be opened for appending.
        let writer = EventWriter::new(temp.path(), "session-1");
        assert!(writer.emit("log_entry", EventPayload::new()).is_err());
        Ok(())
    }
}
