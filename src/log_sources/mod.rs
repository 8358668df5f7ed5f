//! Log source abstraction layer.
//!
//! Each supported [`LogFormat`] has one [`LogSource`] implementation that
//! knows how to tokenize a line, which defaults fill missing fields, which
//! format-specific severity rules apply, and which card hints to compute.
//! [`source_for`] is the only place the format tag is branched on.
//!
//! Copyright (c) 2026 CIPS Corps. All rights reserved.

pub mod auth_log;
pub mod normalize;
pub mod syslog;
pub mod web_log;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::severity::SeverityRule;
use crate::{CardHint, HintConfig, LogFormat, LogRecord, SeverityLevel};

pub use normalize::normalize;

// ---------------------------------------------------------------------------
// Raw (pre-classification) records
// ---------------------------------------------------------------------------

/// Tokenizer output. Every field is optional until [`normalize`] fills
/// `service` and `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub timestamp: Option<String>,
    pub host: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub protocol: Option<String>,
    pub status: Option<u16>,
    pub bytes: Option<String>,
    pub ip: Option<String>,
    pub user: Option<String>,
    pub referrer: Option<String>,
    pub agent: Option<String>,
}

impl RawRecord {
    /// Freeze a normalized raw record into a classified [`LogRecord`].
    ///
    /// Callers are expected to have run [`normalize`] first; the fallbacks
    /// here only keep the conversion total.
    pub fn into_record(self, severity: SeverityLevel) -> LogRecord {
        LogRecord {
            timestamp: self.timestamp.unwrap_or_default(),
            host: self.host,
            service: self.service.unwrap_or_else(|| "unknown".to_string()),
            message: self
                .message
                .unwrap_or_else(|| normalize::NO_MESSAGE.to_string()),
            method: self.method,
            path: self.path,
            protocol: self.protocol,
            status: self.status,
            bytes: self.bytes,
            ip: self.ip,
            user: self.user,
            referrer: self.referrer,
            agent: self.agent,
            severity,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-format strategy
// ---------------------------------------------------------------------------

pub trait LogSource: Send + Sync {
    fn format(&self) -> LogFormat;

    /// Lines with fewer whitespace-delimited tokens than this are dropped.
    fn min_tokens(&self) -> usize;

    /// Split one line into raw fields. `None` means the line is malformed.
    fn tokenize_line(&self, line: &str) -> Option<RawRecord>;

    /// Service name used when the line carried none.
    fn default_service(&self) -> &'static str;

    /// Message used when the line carried none. May fill other fields the
    /// synthesized message depends on.
    fn default_message(&self, raw: &mut RawRecord) -> String;

    /// Format-specific severity pass, evaluated in order.
    fn severity_rules(&self) -> &'static [SeverityRule];

    /// Headline statistics over the full record set.
    fn card_hints(&self, records: &[LogRecord], config: &HintConfig) -> Vec<CardHint>;
}

static AUTH_LOG: auth_log::AuthLogSource = auth_log::AuthLogSource;
static SYSLOG: syslog::SyslogSource = syslog::SyslogSource;
static WEB_LOG: web_log::WebLogSource = web_log::WebLogSource;

/// The strategy implementing `format`.
pub fn source_for(format: LogFormat) -> &'static dyn LogSource {
    match format {
        LogFormat::Auth => &AUTH_LOG,
        LogFormat::Syslog => &SYSLOG,
        LogFormat::ApacheAccess => &WEB_LOG,
    }
}

// ---------------------------------------------------------------------------
// Tokenizing a whole blob
// ---------------------------------------------------------------------------

/// Result of tokenizing a text blob.
#[derive(Debug, Clone, Default)]
pub struct Tokenized {
    pub records: Vec<RawRecord>,

    /// Non-blank lines dropped for having too few tokens.
    pub skipped: usize,
}

/// Split `raw_text` into lines and tokenize each with the format's source.
///
/// Blank lines are ignored. Malformed lines are dropped and counted.
pub fn tokenize(raw_text: &str, format: LogFormat) -> Tokenized {
    let source = source_for(format);
    let mut out = Tokenized::default();

    for (idx, line) in raw_text.split('\n').enumerate() {
        let line = line.trim_end_matches('\r').trim();
        if line.is_empty() {
            continue;
        }
        match source.tokenize_line(line) {
            Some(raw) => out.records.push(raw),
            None => {
                log::debug!("Dropping malformed {} line {}: {:?}", format, idx + 1, line);
                out.skipped += 1;
            }
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Shared syslog-style header splitting (auth.log and syslog)
// ---------------------------------------------------------------------------

/// BSD syslog stamp "Mon DD HH:MM:SS" (day may be space padded).
static RE_BSD_STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][a-z]{2} +\d{1,2} \d{2}:\d{2}:\d{2}(?: |$)").expect("regex")
});

/// "[1234]" style pid suffixes on the process token.
static RE_PID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d*\]").expect("regex"));

/// Positional fields of a "timestamp host service[pid]: message" line.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct HeaderTokens {
    pub timestamp: Option<String>,
    pub host: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
    /// Number of space-delimited tokens, counting the timestamp as one.
    pub count: usize,
}

/// Read a line positionally as timestamp, host, service token, message.
///
/// A leading BSD stamp counts as a single timestamp token; otherwise the
/// first space-delimited token is the timestamp (ISO 8601 in modern
/// rsyslog/journald output). Index access past the end yields `None`.
pub(crate) fn split_header(line: &str) -> HeaderTokens {
    let (timestamp, rest) = match RE_BSD_STAMP.find(line) {
        Some(m) => (m.as_str().trim_end(), &line[m.end()..]),
        None => match line.split_once(' ') {
            Some((first, rest)) => (first, rest),
            None => (line, ""),
        },
    };

    let tokens: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(' ').collect()
    };

    let message = if tokens.len() > 2 {
        Some(tokens[2..].join(" ")).filter(|m| !m.trim().is_empty())
    } else {
        None
    };

    HeaderTokens {
        timestamp: non_empty(timestamp),
        host: tokens.first().and_then(|t| non_empty(t)),
        service: tokens.get(1).and_then(|t| clean_service(t)),
        message,
        count: 1 + tokens.len(),
    }
}

/// Strip `[pid]` groups and colons from a process token.
pub(crate) fn clean_service(token: &str) -> Option<String> {
    let without_pid = RE_PID.replace_all(token, "");
    let cleaned = without_pid.replace(':', "");
    non_empty(&cleaned)
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
