//! Parser for Apache/Nginx access logs (common and combined format).
//!
//! Format: `IP ident user [DD/Mon/YYYY:HH:MM:SS +ZZZZ] "METHOD /path HTTP/x.x" status size "referer" "user-agent"`
//!
//! Fields are not read positionally. The line is scanned into tokens
//! (bracketed and quoted blocks stay whole) and each token is classified by
//! its shape, so lines with missing or reordered fields still yield what
//! they carry.
//!
//! Copyright (c) 2026 CIPS Corps. All rights reserved.

use regex::Regex;
use std::net::Ipv6Addr;
use std::sync::LazyLock;

use crate::aggregate::hints;
use crate::log_sources::{LogSource, RawRecord};
use crate::severity::SeverityRule;
use crate::{CardHint, HintConfig, HintValue, LogFormat, LogRecord};

static RE_IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("regex")
});

const WEB_RULES: &[SeverityRule] = &[SeverityRule::HttpResponse];

pub struct WebLogSource;

impl LogSource for WebLogSource {
    fn format(&self) -> LogFormat {
        LogFormat::ApacheAccess
    }

    fn min_tokens(&self) -> usize {
        3
    }

    fn tokenize_line(&self, line: &str) -> Option<RawRecord> {
        let tokens = scan_tokens(line);
        if tokens.len() < self.min_tokens() {
            return None;
        }
        Some(classify_tokens(&tokens))
    }

    fn default_service(&self) -> &'static str {
        "Apache2"
    }

    fn default_message(&self, raw: &mut RawRecord) -> String {
        let method = raw.method.get_or_insert_with(|| "GET".to_string()).clone();
        let path = raw.path.get_or_insert_with(|| "/".to_string()).clone();
        let status = raw
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let ip = raw.ip.as_deref().unwrap_or("-");
        format!("HTTP {} response from {} for {} {}", status, ip, method, path)
    }

    fn severity_rules(&self) -> &'static [SeverityRule] {
        WEB_RULES
    }

    fn card_hints(&self, records: &[LogRecord], config: &HintConfig) -> Vec<CardHint> {
        let client_errors =
            hints::count_where(records, |r| matches!(r.status, Some(400..=499)));
        let server_errors = hints::count_where(records, |r| matches!(r.status, Some(500..=599)));

        let top_paths = hints::top_n(records.iter().filter_map(|r| r.path.as_deref()), config.top_paths);
        let top_paths = if top_paths.is_empty() {
            "-".to_string()
        } else {
            top_paths
                .iter()
                .map(|(path, n)| format!("{} ({})", path, n))
                .collect::<Vec<_>>()
                .join(", ")
        };

        vec![
            CardHint::new("Total Requests", records.len()),
            CardHint::new(
                "Unique Client IPs",
                hints::distinct_count(records.iter().filter_map(|r| r.ip.as_deref())),
            ),
            CardHint::new("Client Errors (4xx)", client_errors),
            CardHint::new("Server Errors (5xx)", server_errors),
            CardHint {
                title: "Most Requested Path".to_string(),
                value: HintValue::Text(top_paths),
            },
        ]
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    /// Contents of a `[...]` block.
    Bracketed(&'a str),
    /// Contents of a `"..."` block, escapes left as-is.
    Quoted(&'a str),
    Bare(&'a str),
}

/// Split a line on whitespace, keeping `[...]` and `"..."` blocks whole.
///
/// An unterminated block runs to the end of the line.
fn scan_tokens(line: &str) -> Vec<Token<'_>> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' => i += 1,
            b'[' => {
                let start = i + 1;
                let end = line[start..].find(']').map_or(line.len(), |p| start + p);
                tokens.push(Token::Bracketed(&line[start..end]));
                i = end + 1;
            }
            b'"' => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end] != b'"' {
                    end += if bytes[end] == b'\\' { 2 } else { 1 };
                }
                let end = end.min(bytes.len());
                tokens.push(Token::Quoted(&line[start..end]));
                i = end + 1;
            }
            _ => {
                let start = i;
                while i < bytes.len() && bytes[i] != b' ' && bytes[i] != b'\t' {
                    i += 1;
                }
                tokens.push(Token::Bare(&line[start..i]));
            }
        }
    }

    tokens
}

/// Assign scanned tokens to fields by shape.
fn classify_tokens(tokens: &[Token<'_>]) -> RawRecord {
    let mut raw = RawRecord::default();
    let mut quoted_seen = 0;
    let mut remaining: Vec<&str> = Vec::new();

    // Numbers only count as status/bytes once the request block (or, without
    // one, the timestamp) has gone by. Before that they are ident/user.
    let has_quoted = tokens.iter().any(|t| matches!(t, Token::Quoted(_)));
    let has_bracketed = tokens.iter().any(|t| matches!(t, Token::Bracketed(_)));
    let mut numbers_open = !has_quoted && !has_bracketed;

    for token in tokens {
        match *token {
            Token::Bracketed(ts) => {
                raw.timestamp = Some(ts.to_string());
                if !has_quoted {
                    numbers_open = true;
                }
            }
            Token::Quoted(block) => {
                quoted_seen += 1;
                numbers_open = true;
                match quoted_seen {
                    1 => {
                        let mut parts = block.splitn(3, ' ');
                        raw.method = parts.next().filter(|s| !s.is_empty()).map(String::from);
                        raw.path = parts.next().filter(|s| !s.is_empty()).map(String::from);
                        raw.protocol = parts.next().filter(|s| !s.is_empty()).map(String::from);
                    }
                    2 => raw.referrer = dash_is_none(block),
                    3 => raw.agent = dash_is_none(block),
                    _ => {}
                }
            }
            Token::Bare(word) => {
                let all_digits = !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit());
                if all_digits && !numbers_open {
                    remaining.push(word);
                } else if all_digits && word.len() == 3 && raw.status.is_none() {
                    raw.status = word.parse().ok();
                } else if all_digits || word == "-" {
                    raw.bytes = dash_is_none(word);
                } else {
                    remaining.push(word);
                }
            }
        }
    }

    let ip_idx = remaining
        .iter()
        .position(|t| RE_IPV4.is_match(t) || is_ipv6(t));
    if let Some(idx) = ip_idx {
        raw.ip = Some(remaining[idx].to_string());
    }
    raw.user = remaining
        .iter()
        .enumerate()
        .find(|(idx, _)| Some(*idx) != ip_idx)
        .and_then(|(_, t)| dash_is_none(t));

    raw
}

/// A parseable IPv6 address with at least one hex digit. "::" and clock
/// times like "12:34:56" stay available for the user slot.
fn is_ipv6(token: &str) -> bool {
    token.bytes().any(|b| b.is_ascii_hexdigit()) && token.parse::<Ipv6Addr>().is_ok()
}

fn dash_is_none(s: &str) -> Option<String> {
    if s == "-" || s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
