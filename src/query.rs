//! # Query Engine
//!
//! Drill-down filtering over a parsed record set. A [`Query`] is a list of
//! `(field, needle)` terms; a record matches when every term's field is
//! present and contains the needle, both sides lower-cased.
//!
//! Field names are looked up case-insensitively. A field outside the record
//! schema, or one that no record in the set carries, is reported as
//! [`SiftError::UnknownField`] so callers can tell "bad query" apart from
//! "no matches".

use std::borrow::Cow;

use crate::{LogRecord, SiftError, SiftResult};

/// Every queryable field name, in display order.
pub const FIELDS: &[&str] = &[
    "timestamp",
    "host",
    "service",
    "message",
    "method",
    "path",
    "protocol",
    "status",
    "bytes",
    "ip",
    "user",
    "referrer",
    "agent",
    "severity",
];

/// Resolve a user-supplied field name to its canonical form.
///
/// `hostname` is accepted for `host`.
pub fn canonical_field(name: &str) -> Option<&'static str> {
    let lower = name.trim().to_ascii_lowercase();
    if lower == "hostname" {
        return Some("host");
    }
    FIELDS.iter().copied().find(|f| *f == lower)
}

impl LogRecord {
    /// The string value of a canonical field, or `None` when absent.
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match canonical_field(name)? {
            "timestamp" => Some(Cow::Borrowed(self.timestamp.as_str())),
            "host" => borrowed(&self.host),
            "service" => Some(Cow::Borrowed(self.service.as_str())),
            "message" => Some(Cow::Borrowed(self.message.as_str())),
            "method" => borrowed(&self.method),
            "path" => borrowed(&self.path),
            "protocol" => borrowed(&self.protocol),
            "status" => self.status.map(|s| Cow::Owned(s.to_string())),
            "bytes" => borrowed(&self.bytes),
            "ip" => borrowed(&self.ip),
            "user" => borrowed(&self.user),
            "referrer" => borrowed(&self.referrer),
            "agent" => borrowed(&self.agent),
            "severity" => Some(Cow::Borrowed(self.severity.as_str())),
            _ => None,
        }
    }
}

fn borrowed(value: &Option<String>) -> Option<Cow<'_, str>> {
    value.as_deref().map(Cow::Borrowed)
}

/// A conjunctive field -> substring predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    terms: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field contains needle` term.
    pub fn with(mut self, field: &str, needle: &str) -> Self {
        self.terms.push((field.to_string(), needle.to_string()));
        self
    }

    /// Parse `key=value` words into terms. Words without `=` are joined
    /// into a single `message` term, so plain free text searches messages.
    pub fn parse(text: &str) -> Self {
        let mut query = Query::new();
        let mut free_text: Vec<&str> = Vec::new();

        for word in text.split_whitespace() {
            match word.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    query.terms.push((key.to_string(), value.to_string()));
                }
                _ => free_text.push(word),
            }
        }
        if !free_text.is_empty() {
            query.terms.push(("message".to_string(), free_text.join(" ")));
        }
        query
    }

    pub fn terms(&self) -> &[(String, String)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Query {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Query {
            terms: iter
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
        }
    }
}

/// Return the records matching every term of `query`, in input order.
pub fn search<'r>(records: &'r [LogRecord], query: &Query) -> SiftResult<Vec<&'r LogRecord>> {
    let mut resolved: Vec<(&'static str, String)> = Vec::with_capacity(query.terms.len());

    for (field, needle) in &query.terms {
        let canonical = canonical_field(field).ok_or_else(|| {
            log::warn!("Query references unknown field {:?}", field);
            SiftError::UnknownField(field.clone())
        })?;
        if !records.iter().any(|r| r.field(canonical).is_some()) {
            log::warn!("Query field {:?} is absent from every record", field);
            return Err(SiftError::UnknownField(field.clone()));
        }
        resolved.push((canonical, needle.to_lowercase()));
    }

    Ok(records
        .iter()
        .filter(|record| {
            resolved.iter().all(|(field, needle)| {
                record
                    .field(field)
                    .is_some_and(|value| value.to_lowercase().contains(needle.as_str()))
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sources::RawRecord;
    use crate::SeverityLevel;

    fn record(service: &str, message: &str, severity: SeverityLevel) -> LogRecord {
        RawRecord {
            timestamp: Some("Jun 20 12:00:00".into()),
            host: Some("box".into()),
            service: Some(service.into()),
            message: Some(message.into()),
            ..Default::default()
        }
        .into_record(severity)
    }

    fn sample() -> Vec<LogRecord> {
        vec![
            record("sshd", "Accepted publickey for git", SeverityLevel::High),
            record("sshd", "Failed password for admin", SeverityLevel::Medium),
            record("CRON", "session opened for user root", SeverityLevel::Medium),
            record("systemd-logind", "New session 3", SeverityLevel::High),
        ]
    }

    #[test]
    fn test_service_and_severity() {
        let records = sample();
        let query: Query = [("service", "sshd"), ("severity", "high")].into_iter().collect();
        let hits = search(&records, &query).expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].message, "Accepted publickey for git");
    }

    #[test]
    fn test_substring_and_case_insensitive() {
        let records = sample();
        let hits = search(&records, &Query::new().with("Service", "SYSTEMD")).expect("search");
        assert_eq!(hits.len(), 1);
        let hits = search(&records, &Query::new().with("service", "cron")).expect("search");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_hostname_alias() {
        let records = sample();
        let hits = search(&records, &Query::new().with("hostname", "box")).expect("search");
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn test_unknown_field_name() {
        let records = sample();
        let err = search(&records, &Query::new().with("color", "red")).unwrap_err();
        assert!(matches!(err, SiftError::UnknownField(ref f) if f == "color"));
    }

    #[test]
    fn test_field_absent_from_every_record() {
        let records = sample();
        let err = search(&records, &Query::new().with("status", "200")).unwrap_err();
        assert!(matches!(err, SiftError::UnknownField(_)));
    }

    #[test]
    fn test_no_match_is_empty_ok() {
        let records = sample();
        let hits = search(&records, &Query::new().with("service", "nginx")).expect("search");
        assert!(hits.is_empty());
    }

    #[test]
    fn test_empty_query_matches_all() {
        let records = sample();
        assert_eq!(search(&records, &Query::new()).expect("search").len(), 4);
    }

    #[test]
    fn test_empty_record_set() {
        let err = search(&[], &Query::new().with("service", "sshd")).unwrap_err();
        assert!(matches!(err, SiftError::UnknownField(ref f) if f == "service"));
        assert!(search(&[], &Query::new()).expect("search").is_empty());
    }

    #[test]
    fn test_parse_key_values_and_free_text() {
        let query = Query::parse("service=sshd severity=high failed   password");
        assert_eq!(
            query.terms(),
            &[
                ("service".to_string(), "sshd".to_string()),
                ("severity".to_string(), "high".to_string()),
                ("message".to_string(), "failed password".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_free_text_only() {
        let records = sample();
        let query = Query::parse("Failed Password");
        let hits = search(&records, &query).expect("search");
        assert_eq!(hits.len(), 1);
        assert!(Query::parse("   ").is_empty());
    }

    #[test]
    fn test_status_matches_as_string() {
        let mut web = record("Apache2", "HTTP 503 response", SeverityLevel::Critical);
        web.status = Some(503);
        let records = vec![web];
        let hits = search(&records, &Query::new().with("status", "50")).expect("search");
        assert_eq!(hits.len(), 1);
    }
}
