use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::ErrorClass;
use crate::models::{OperationKind, Tier};

/// One line of the operation journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalEvent {
    AttemptStarted {
        operation: OperationKind,
        tier: &'static str,
        model: String,
        attempt: u32,
    },
    AttemptFailed {
        operation: OperationKind,
        tier: &'static str,
        model: String,
        attempt: u32,
        class: ErrorClass,
        detail: String,
    },
    CredentialRequested {
        operation: OperationKind,
        granted: bool,
    },
    TierFallback {
        operation: OperationKind,
        from: &'static str,
        to: &'static str,
        class: ErrorClass,
    },
    OperationFinished {
        operation: OperationKind,
        outcome: Outcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        class: Option<ErrorClass>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Error,
}

impl JournalEvent {
    pub fn attempt_started(operation: OperationKind, tier: Tier, model: &str, attempt: u32) -> Self {
        JournalEvent::AttemptStarted {
            operation,
            tier: tier.as_str(),
            model: model.to_string(),
            attempt,
        }
    }

    pub fn tier_fallback(operation: OperationKind, from: Tier, to: Tier, class: ErrorClass) -> Self {
        JournalEvent::TierFallback {
            operation,
            from: from.as_str(),
            to: to.as_str(),
            class,
        }
    }
}

/// Append-only JSONL journal shared by every operation of one session.
///
/// Each line carries `type`, `session_id` and `ts`, followed by the event's
/// own fields. Lines are compact JSON.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<EventWriterInner>,
}

#[derive(Debug)]
struct EventWriterInner {
    path: PathBuf,
    session_id: String,
    lock: Mutex<()>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EventWriterInner {
                path: path.into(),
                session_id: session_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn record(&self, event: &JournalEvent) -> anyhow::Result<Value> {
        let fields = match serde_json::to_value(event)? {
            Value::Object(fields) => fields,
            other => anyhow::bail!("journal event serialized to non-object: {other}"),
        };

        let mut line = Map::new();
        line.insert(
            "session_id".to_string(),
            Value::String(self.inner.session_id.clone()),
        );
        line.insert("ts".to_string(), Value::String(now_utc_iso()));
        line.extend(fields);

        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let encoded = serde_json::to_string(&line)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("journal lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        file.write_all(encoded.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(Value::Object(line))
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::DateTime;

    use super::*;

    #[test]
    fn record_writes_tagged_line() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("journal").join("events.jsonl");
        let writer = EventWriter::new(&path, "session-42");

        let emitted = writer.record(&JournalEvent::attempt_started(
            OperationKind::Upscale,
            Tier::HighFidelity,
            "gemini-3-pro-image-preview",
            1,
        ))?;

        let content = fs::read_to_string(&path)?;
        let parsed: Value = serde_json::from_str(content.lines().next().unwrap_or(""))?;
        assert_eq!(parsed, emitted);
        assert_eq!(parsed["type"], "attempt_started");
        assert_eq!(parsed["session_id"], "session-42");
        assert_eq!(parsed["operation"], "upscale");
        assert_eq!(parsed["tier"], "high_fidelity");
        assert_eq!(parsed["attempt"], 1);
        DateTime::parse_from_rfc3339(parsed["ts"].as_str().unwrap_or(""))?;
        Ok(())
    }

    #[test]
    fn finished_event_omits_absent_fields() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::new(temp.path().join("events.jsonl"), "s");

        let success = writer.record(&JournalEvent::OperationFinished {
            operation: OperationKind::Generate,
            outcome: Outcome::Success,
            class: None,
            message: None,
        })?;
        assert_eq!(success["outcome"], "success");
        assert!(success.get("class").is_none());

        let failure = writer.record(&JournalEvent::OperationFinished {
            operation: OperationKind::TryOn,
            outcome: Outcome::Error,
            class: Some(ErrorClass::Quota),
            message: Some("Failed to generate try-on image.".to_string()),
        })?;
        assert_eq!(failure["class"], "quota");
        Ok(())
    }

    #[test]
    fn record_appends_lines_in_order() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::new(&path, "s");

        writer.record(&JournalEvent::CredentialRequested {
            operation: OperationKind::Generate,
            granted: true,
        })?;
        writer.record(&JournalEvent::tier_fallback(
            OperationKind::Upscale,
            Tier::HighFidelity,
            Tier::FastDraft,
            ErrorClass::Quota,
        ))?;

        let content = fs::read_to_string(&path)?;
        let lines: Vec<Value> = content
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "credential_requested");
        assert_eq!(lines[1]["type"], "tier_fallback");
        assert_eq!(lines[1]["from"], "high_fidelity");
        assert_eq!(lines[1]["to"], "fast_draft");
        Ok(())
    }
}
