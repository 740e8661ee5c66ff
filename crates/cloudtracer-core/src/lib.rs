//! Core types for the CloudTracer RCA system
//! Shared data structures used across the pipeline, evaluation and CLI crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// LOG LEVEL //

/// Log severity levels (ordered from lowest to highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warning),
            "error" | "err" => Some(Self::Error),
            "fatal" | "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }

    /// True for levels above the informational threshold
    pub fn is_notable(&self) -> bool {
        *self >= Self::Warning
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// LOG ENTRY //

/// A single structured service log line. Immutable once created;
/// timestamp ordering carries the cause/effect semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,

    /// Emitting service (nova-api, nova-scheduler, keystone, ...)
    pub service_type: String,

    pub level: LogLevel,

    pub message: String,

    #[serde(default)]
    pub instance_id: Option<String>,

    #[serde(default)]
    pub request_id: Option<String>,

    #[serde(default)]
    pub source_file: Option<String>,
}

impl LogEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        service_type: impl Into<String>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            service_type: service_type.into(),
            level,
            message: message.into(),
            instance_id: None,
            request_id: None,
            source_file: None,
        }
    }

    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    /// Render the entry as one line of LLM context
    pub fn context_line(&self) -> String {
        let mut line = format!(
            "{} [{}] {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.service_type,
            self.message
        );
        if let Some(ref id) = self.instance_id {
            line.push_str(&format!(" (instance: {})", id));
        }
        if let Some(ref id) = self.request_id {
            line.push_str(&format!(" (request: {})", id));
        }
        line
    }
}

// LOG WINDOW //

/// Time-ordered, read-only collection of log entries forming the analysis input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogWindow {
    entries: Vec<LogEntry>,
}

impl LogWindow {
    /// Build a window from entries, sorting into timestamp order
    pub fn from_entries(mut entries: Vec<LogEntry>) -> Self {
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Self { entries }
    }

    /// Ingest newline-delimited JSON log entries
    pub fn from_json_lines(input: &str) -> Result<Self, serde_json::Error> {
        let mut entries = Vec::new();
        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            entries.push(serde_json::from_str::<LogEntry>(line)?);
        }
        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }
}

// ANALYSIS MODE //

/// Which pipeline shape to run: fast skips similarity retrieval,
/// hybrid narrows candidates with it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Fast,
    Hybrid,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!("unknown analysis mode: {}", other)),
        }
    }
}

// ANALYSIS RESULT //

/// Output of one orchestrator invocation. Fixed fields with explicit
/// defaults so every consumer can rely on field presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Free-text root-cause narrative from the synthesizer
    pub root_cause_analysis: String,

    /// Category label, never empty ("unknown" when nothing matched)
    pub issue_category: String,

    /// Entries that made it into the reasoning context
    pub relevant_logs_count: usize,

    pub analysis_mode: AnalysisMode,

    /// True only when mode is hybrid and retrieval returned without error
    pub vector_db_used: bool,

    /// True when the rule-based classifier fallback scored the entries
    pub classifier_fallback: bool,

    /// Wall-clock duration of the analysis
    pub elapsed_time: Duration,
}

impl AnalysisResult {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_time.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 5, 16, 1, minute, 0).unwrap()
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(LogLevel::parse_str("WARNING"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse_str("warn"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse_str("crit"), Some(LogLevel::Critical));
        assert_eq!(LogLevel::parse_str("nope"), None);
        assert!(LogLevel::Error > LogLevel::Warning);
        assert!(LogLevel::Error.is_notable());
        assert!(!LogLevel::Info.is_notable());
    }

    #[test]
    fn test_window_sorts_by_timestamp() {
        let window = LogWindow::from_entries(vec![
            LogEntry::new(ts(30), "nova-compute", LogLevel::Error, "late"),
            LogEntry::new(ts(10), "nova-api", LogLevel::Info, "early"),
        ]);
        assert_eq!(window.len(), 2);
        assert_eq!(window.entries()[0].message, "early");
        assert_eq!(window.entries()[1].message, "late");
    }

    #[test]
    fn test_window_from_json_lines() {
        let input = r#"
{"timestamp":"2017-05-16T01:15:00Z","service_type":"keystone","level":"ERROR","message":"Token validation failed"}
{"timestamp":"2017-05-16T01:10:00Z","service_type":"nova-api","level":"INFO","message":"POST /servers status: 202"}
"#;
        let window = LogWindow::from_json_lines(input).unwrap();
        assert_eq!(window.len(), 2);
        // sorted on ingest
        assert_eq!(window.entries()[0].service_type, "nova-api");
        assert!(window.entries()[1].request_id.is_none());
    }

    #[test]
    fn test_mode_round_trip() {
        assert_eq!("fast".parse::<AnalysisMode>().unwrap(), AnalysisMode::Fast);
        assert_eq!("HYBRID".parse::<AnalysisMode>().unwrap(), AnalysisMode::Hybrid);
        assert!("turbo".parse::<AnalysisMode>().is_err());
        assert_eq!(AnalysisMode::Hybrid.to_string(), "hybrid");
    }

    #[test]
    fn test_context_line() {
        let entry = LogEntry::new(ts(16), "nova-scheduler", LogLevel::Warning, "insufficient disk space")
            .with_instance_id("c4f2a8b2")
            .with_request_id("req-9bc36dd9");
        let line = entry.context_line();
        assert!(line.contains("[WARNING]"));
        assert!(line.contains("nova-scheduler"));
        assert!(line.contains("(instance: c4f2a8b2)"));
        assert!(line.contains("(request: req-9bc36dd9)"));
    }
}
