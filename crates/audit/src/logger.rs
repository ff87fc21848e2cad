//! Append-only structured event logging to `events.jsonl`.
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::json;

use crate::error::AuditError;
use crate::helpers::iso_timestamp;
use crate::models::LogEvent;

/// JSONL audit logger with a persistent, append-only file handle. Every
/// event is flushed immediately so `events.jsonl` is complete on disk even
/// if the process is killed mid-run.
pub struct AuditLogger {
    run_id: String,
    log_path: PathBuf,
    current_stage: Mutex<Option<String>>,
    file: Mutex<BufWriter<File>>,
}

impl AuditLogger {
    pub fn new(run_id: impl Into<String>, log_path: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AuditError::Io { path: parent.display().to_string(), message: e.to_string() })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| AuditError::Io { path: log_path.display().to_string(), message: e.to_string() })?;

        Ok(AuditLogger {
            run_id: run_id.into(),
            log_path,
            current_stage: Mutex::new(None),
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn set_stage(&self, stage: Option<String>) {
        *self.current_stage.lock().expect("audit logger stage lock poisoned") = stage;
    }

    /// Flushes and drops the underlying write buffer; the file descriptor
    /// closes when this logger is dropped.
    pub fn close(&self) -> Result<(), AuditError> {
        let mut file = self.file.lock().expect("audit logger file lock poisoned");
        file.flush().map_err(|e| AuditError::Io { path: self.log_path.display().to_string(), message: e.to_string() })
    }

    pub fn event(&self, event_type: &str, data: serde_json::Value, level: &str, stage: Option<&str>, rid: Option<&str>) {
        let stage = stage
            .map(String::from)
            .or_else(|| self.current_stage.lock().expect("audit logger stage lock poisoned").clone());

        let log_event = LogEvent {
            ts: iso_timestamp(),
            run_id: self.run_id.clone(),
            level: level.to_string(),
            event: event_type.to_string(),
            data,
            stage,
            rid: rid.map(String::from),
        };

        self.write_event(&log_event);
    }

    fn write_event(&self, event: &LogEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(_) => return,
        };
        let mut file = self.file.lock().expect("audit logger file lock poisoned");
        let _ = writeln!(file, "{line}");
        let _ = file.flush();
    }

    pub fn run_started(&self, command: &[String], parameters: &serde_json::Value) {
        self.event("run_started", json!({"command": command, "parameters": parameters}), "INFO", None, None);
    }

    pub fn run_finished(&self, status: &str, duration_seconds: f64, records_processed: Option<u64>) {
        let mut data = json!({"status": status, "duration_seconds": duration_seconds});
        if let Some(n) = records_processed {
            data["records_processed"] = json!(n);
        }
        self.event("run_finished", data, "INFO", None, None);
    }

    pub fn stage_started(&self, stage: &str, expected_records: Option<u64>) {
        self.set_stage(Some(stage.to_string()));
        let mut data = json!({});
        if let Some(n) = expected_records {
            data["expected_records"] = json!(n);
        }
        self.event("stage_started", data, "INFO", Some(stage), None);
    }

    pub fn stage_finished(&self, stage: &str, duration_seconds: f64, counters: &std::collections::BTreeMap<String, u64>) {
        let mut data = json!({"duration_seconds": duration_seconds});
        if !counters.is_empty() {
            data["counters"] = json!(counters);
        }
        self.event("stage_finished", data, "INFO", Some(stage), None);
    }

    pub fn record_flagged(&self, rid: &str, flag_name: &str, reason_code: &str, stage: Option<&str>) {
        self.event(
            "record_flagged",
            json!({"flag_name": flag_name, "reason_code": reason_code}),
            "INFO",
            stage,
            Some(rid),
        );
    }

    pub fn artifact_written(&self, path: &str, sha256: &str, stage: Option<&str>, bytes_written: Option<u64>, record_count: Option<u64>) {
        let mut data = json!({"path": path, "sha256": sha256});
        if let Some(n) = bytes_written {
            data["bytes"] = json!(n);
        }
        if let Some(n) = record_count {
            data["record_count"] = json!(n);
        }
        self.event("artifact_written", data, "INFO", stage, None);
    }

    pub fn error(&self, exception_class: &str, message: &str, stage: Option<&str>, rid: Option<&str>, traceback: Option<&str>) {
        let mut data = json!({"exception_class": exception_class, "message": message});
        if let Some(tb) = traceback {
            data["traceback"] = json!(tb);
        }
        if let Some(rid) = rid {
            data["rid"] = json!(rid);
        }
        self.event("error", data, "ERROR", stage, rid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("events.jsonl");
        let logger = AuditLogger::new("run-1", &log_path).unwrap();

        logger.run_started(&["srdedupe".to_string(), "run".to_string()], &json!({"alpha": 0.05}));
        logger.stage_started("ingest", Some(10));
        logger.stage_finished("ingest", 1.5, &std::collections::BTreeMap::from([("records_in".to_string(), 10u64)]));
        logger.close().unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["run_id"], "run-1");
        }
    }

    #[test]
    fn stage_context_carries_to_subsequent_events() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("events.jsonl");
        let logger = AuditLogger::new("run-2", &log_path).unwrap();

        logger.stage_started("scoring", None);
        logger.record_flagged("rid-1", "title_truncated", "title_truncated", None);
        logger.close().unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        let second_line: serde_json::Value = serde_json::from_str(content.lines().nth(1).unwrap()).unwrap();
        assert_eq!(second_line["stage"], "scoring");
    }
}
