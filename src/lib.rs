//! # logsift - Core Library
//!
//! Turns raw auth.log, syslog and Apache access log text into structured,
//! severity-tagged records plus per-service counters and headline stats.
//!
//! ## Pipeline
//! raw text + [`LogFormat`] -> tokenizer -> normalizer -> severity rules
//! -> records -> aggregator (service summaries, totals, card hints).
//! The query engine filters the resulting record set on demand.
//!
//! Every run allocates fresh output. Nothing is cached between runs.

pub mod aggregate;
pub mod loader;
pub mod log_sources;
pub mod pipeline;
pub mod query;
pub mod severity;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub use aggregate::{ServiceSummary, SeverityCounts, SeverityTotals};
pub use log_sources::RawRecord;
pub use pipeline::{parse, parse_tagged, ParseOutput, Pipeline};
pub use query::{search, Query};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for logsift.
#[derive(Error, Debug)]
pub enum SiftError {
    #[error("Unsupported log format: {0}")]
    UnsupportedFormat(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Unknown query field: {0}")]
    UnknownField(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type SiftResult<T> = Result<T, SiftError>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Top-level configuration.
///
/// Loaded from `logsift.toml` in the working directory or a path supplied
/// via `--config`. Every section has defaults, so a partial file is fine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    pub general: GeneralConfig,
    pub hints: HintConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Format tag used when `--format` is not given on the command line.
    pub default_format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HintConfig {
    /// How many paths the "Most Requested Path" hint lists.
    pub top_paths: usize,

    /// Emit a "Lines Skipped" hint counting malformed lines.
    pub report_skipped_lines: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print JSON instead of tables.
    pub json: bool,

    /// Maximum record rows printed in table mode. 0 = unlimited.
    pub max_rows: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_format: LogFormat::Syslog,
        }
    }
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            top_paths: 1,
            report_skipped_lines: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: false,
            max_rows: 200,
        }
    }
}

impl SiftConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> SiftResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SiftConfig = toml::from_str(&content)?;
        if config.hints.top_paths == 0 {
            return Err(SiftError::Config(
                "hints.top_paths must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Write the default configuration to a TOML file.
    pub fn write_default(path: &std::path::Path) -> SiftResult<()> {
        let config = Self::default();
        let content =
            toml::to_string_pretty(&config).map_err(|e| SiftError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default location looked up when no `--config` flag is given.
    pub fn default_path() -> PathBuf {
        PathBuf::from("logsift.toml")
    }
}

// ---------------------------------------------------------------------------
// Core Types
// ---------------------------------------------------------------------------

/// The closed set of supported input formats.
///
/// The string tags are part of the external contract and must stay
/// bit-exact: `"auth.log"`, `"syslog"`, `"apache_access"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "auth.log")]
    Auth,
    #[serde(rename = "syslog")]
    Syslog,
    #[serde(rename = "apache_access")]
    ApacheAccess,
}

impl LogFormat {
    pub const ALL: [LogFormat; 3] = [LogFormat::Auth, LogFormat::Syslog, LogFormat::ApacheAccess];

    /// The stable tag for this format.
    pub fn tag(&self) -> &'static str {
        match self {
            LogFormat::Auth => "auth.log",
            LogFormat::Syslog => "syslog",
            LogFormat::ApacheAccess => "apache_access",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for LogFormat {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogFormat::ALL
            .into_iter()
            .find(|format| format.tag() == s)
            .ok_or_else(|| SiftError::UnsupportedFormat(s.to_string()))
    }
}

/// How noteworthy a record is.
///
/// Totally ordered: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 4] = [
        SeverityLevel::Low,
        SeverityLevel::Medium,
        SeverityLevel::High,
        SeverityLevel::Critical,
    ];

    /// One step up the scale, saturating at `Critical`.
    pub fn escalate(self) -> Self {
        match self {
            SeverityLevel::Low => SeverityLevel::Medium,
            SeverityLevel::Medium => SeverityLevel::High,
            SeverityLevel::High | SeverityLevel::Critical => SeverityLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Low => "low",
            SeverityLevel::Medium => "medium",
            SeverityLevel::High => "high",
            SeverityLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed, normalized and classified log line (or HTTP request).
///
/// `service` and `message` are never empty. Format-specific fields are
/// `None` when the source line did not carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    pub service: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    pub severity: SeverityLevel,
}

/// The value shown on a card hint: a count or a short label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HintValue {
    Count(u64),
    Text(String),
}

impl fmt::Display for HintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintValue::Count(n) => write!(f, "{}", n),
            HintValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<usize> for HintValue {
    fn from(n: usize) -> Self {
        HintValue::Count(n as u64)
    }
}

impl From<String> for HintValue {
    fn from(s: String) -> Self {
        HintValue::Text(s)
    }
}

/// A labeled headline statistic over the whole record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardHint {
    pub title: String,
    pub value: HintValue,
}

impl CardHint {
    pub fn new(title: &str, value: impl Into<HintValue>) -> Self {
        Self {
            title: title.to_string(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tags_round_trip() {
        for format in LogFormat::ALL {
            assert_eq!(format.tag().parse::<LogFormat>().unwrap(), format);
        }
        assert_eq!(LogFormat::Auth.to_string(), "auth.log");
    }

    #[test]
    fn test_unknown_format_tag_rejected() {
        let err = "nginx".parse::<LogFormat>().unwrap_err();
        assert!(matches!(err, SiftError::UnsupportedFormat(ref tag) if tag == "nginx"));
        // Tags are exact: no case folding, no ".log" guessing.
        assert!("AUTH.LOG".parse::<LogFormat>().is_err());
        assert!("auth".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_severity_order() {
        assert!(SeverityLevel::Low < SeverityLevel::Medium);
        assert!(SeverityLevel::Medium < SeverityLevel::High);
        assert!(SeverityLevel::High < SeverityLevel::Critical);
    }

    #[test]
    fn test_escalate_saturates() {
        assert_eq!(SeverityLevel::Low.escalate(), SeverityLevel::Medium);
        assert_eq!(SeverityLevel::Medium.escalate(), SeverityLevel::High);
        assert_eq!(SeverityLevel::High.escalate(), SeverityLevel::Critical);
        assert_eq!(SeverityLevel::Critical.escalate(), SeverityLevel::Critical);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&SeverityLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }

    #[test]
    fn test_hint_value_untagged() {
        let count = serde_json::to_string(&CardHint::new("Total Requests", 3usize)).unwrap();
        assert_eq!(count, r#"{"title":"Total Requests","value":3}"#);
        let text = serde_json::to_string(&CardHint::new("Most Requested Path", "/ (2)".to_string())).unwrap();
        assert_eq!(text, r#"{"title":"Most Requested Path","value":"/ (2)"}"#);
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&SiftConfig::default()).unwrap();
        let parsed: SiftConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.general.default_format, LogFormat::Syslog);
        assert_eq!(parsed.hints.top_paths, 1);
        assert!(parsed.hints.report_skipped_lines);
        assert_eq!(parsed.output.max_rows, 200);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: SiftConfig = toml::from_str("[general]\ndefault_format = \"apache_access\"\n").unwrap();
        assert_eq!(parsed.general.default_format, LogFormat::ApacheAccess);
        assert!(!parsed.output.json);
        assert_eq!(parsed.hints.top_paths, 1);
    }
}
