//! Debug logging for recorded points.
//!
//! When enabled, every recorded point is written as one JSON line to stderr,
//! which helps tell which label a collision was resolved to.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// Debug log entry for a recorded memory point
#[derive(Debug, Serialize)]
pub struct RecordDebugLog {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Position of the point in the log
    pub index: usize,
    /// Label the caller asked for (None when omitted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_label: Option<String>,
    /// Label the point was stored under
    pub label: String,
    /// Recorded memory in bytes
    pub bytes: u64,
    /// Whether the measurer was consulted
    pub measured: bool,
}

impl RecordDebugLog {
    pub fn new(index: usize, label: &str, bytes: u64) -> Self {
        Self {
            timestamp: Utc::now(),
            index,
            requested_label: None,
            label: label.to_string(),
            bytes,
            measured: true,
        }
    }

    pub fn with_requested_label(mut self, requested: Option<&str>) -> Self {
        self.requested_label = requested.map(str::to_string);
        self
    }

    pub fn with_measured(mut self, measured: bool) -> Self {
        self.measured = measured;
        self
    }

    /// Write the entry as a single JSON line.
    pub fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        let json = serde_json::to_string(self).unwrap_or_default();
        writeln!(out, "{}", json)
    }

    /// Write the entry to stderr.
    pub fn write(&self) -> std::io::Result<()> {
        self.write_to(&mut std::io::stderr().lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_log_serialization() {
        let log = RecordDebugLog::new(2, "a-2", 4096)
            .with_requested_label(Some("a"))
            .with_measured(false);

        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("\"label\":\"a-2\""));
        assert!(json.contains("\"requested_label\":\"a\""));
        assert!(json.contains("\"measured\":false"));
    }

    #[test]
    fn test_unlabeled_skips_requested_label() {
        let log = RecordDebugLog::new(1, "None", 1);
        let json = serde_json::to_string(&log).unwrap();
        assert!(!json.contains("requested_label"));
    }

    #[test]
    fn test_write_single_line() {
        let mut out = Vec::new();
        RecordDebugLog::new(0, "tracemem init", 10)
            .write_to(&mut out)
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(parsed["index"], 0);
        assert_eq!(parsed["bytes"], 10);
    }
}
