//! JSONL audit trail logging.
//!
//! Each rebalancer run appends events to the configured audit file,
//! one JSON object per line. When no audit file is configured the log is
//! disabled and every call is a no-op.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use nanofolio::{Portfolio, Rebalance};
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: Option<BufWriter<std::fs::File>>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
        })
    }

    /// A log that discards every event.
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    /// Open the log configured under `[logging]`, or a disabled one.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.audit_path() {
            Some(path) => Self::open(&path),
            None => Ok(Self::disabled()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)?;
        writeln!(writer, "{json}")?;
        writer.flush()?;
        Ok(())
    }
}

/// Convenience: log a run start event.
pub fn log_run_started(audit: &mut AuditLog, command: &str, config: &Config) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "command": command,
            "assets": config.input.assets.display().to_string(),
            "allocation": config.input.allocation.display().to_string(),
            "adapter": config.input.adapter.adapter().name(),
            "currency": config.currency(),
        }),
    )
}

/// Convenience: log the loaded portfolio.
pub fn log_portfolio_loaded(audit: &mut AuditLog, portfolio: &Portfolio) -> Result<()> {
    audit.log(
        "portfolio_loaded",
        serde_json::json!({
            "assets": portfolio.assets().len(),
            "targets": portfolio.allocation().len(),
            "total_value": portfolio.total_value()?,
            "currency": portfolio.currency(),
        }),
    )
}

/// Convenience: log a computed rebalance.
pub fn log_rebalance_computed(audit: &mut AuditLog, rebalance: &Rebalance) -> Result<()> {
    let movements: Vec<_> = rebalance
        .iter()
        .filter(|r| r.movement != 0.0)
        .map(|r| {
            serde_json::json!({
                "key": r.key.as_str(),
                "movement": r.movement,
            })
        })
        .collect();

    audit.log(
        "rebalance_computed",
        serde_json::json!({
            "strategy": rebalance.strategy().as_str(),
            "anchor": rebalance.anchor().map(|k| k.as_str()),
            "total_buys": rebalance.total_buys(),
            "total_sells": rebalance.total_sells(),
            "net_movement": rebalance.net_movement(),
            "movements": movements,
        }),
    )
}

/// Convenience: log a failed run.
pub fn log_run_failed(audit: &mut AuditLog, command: &str, error: &Error) -> Result<()> {
    audit.log(
        "run_failed",
        serde_json::json!({
            "command": command,
            "error": error.to_string(),
            "exit_code": error.exit_code(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_log_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_audit.jsonl");

        {
            let mut log = AuditLog::open(&path).unwrap();
            log.log("test_event", serde_json::json!({})).unwrap();
            log.log("test_data", serde_json::json!({"key": "value"}))
                .unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        // Each line should be valid JSON
        for line in &lines {
            let _: serde_json::Value = serde_json::from_str(line).unwrap();
        }

        assert!(lines[0].contains("\"event\":\"test_event\""));
        assert!(lines[1].contains("\"key\":\"value\""));
    }

    #[test]
    fn audit_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        for _ in 0..2 {
            let mut log = AuditLog::open(&path).unwrap();
            log.log("run", serde_json::json!({})).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn audit_log_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("audit.jsonl");

        let mut log = AuditLog::open(&path).unwrap();
        log.log("test", serde_json::json!({})).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn disabled_log_is_a_noop() {
        let mut log = AuditLog::disabled();
        assert!(!log.is_enabled());
        log.log("ignored", serde_json::json!({"a": 1})).unwrap();
    }

    #[test]
    fn run_failed_records_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let mut log = AuditLog::open(&path).unwrap();

        let err = Error::from(nanofolio::Error::InvalidNoSellTarget { violations: vec![] });
        log_run_failed(&mut log, "rebalance", &err).unwrap();

        let line = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["event"], "run_failed");
        assert_eq!(value["command"], "rebalance");
        assert_eq!(value["exit_code"], 2);
    }
}
