//! # Severity Classifier
//!
//! Assigns one of four [`SeverityLevel`]s to a record by walking an ordered
//! rule list top to bottom:
//!
//! 1. generic keyword rules ([`rules::GENERIC_RULES`])
//! 2. the format's own rules ([`crate::log_sources::LogSource::severity_rules`])
//! 3. service-specific rules ([`rules::SERVICE_RULES`])
//!
//! Each rule either escalates (only ever raises the level) or overwrites
//! (sets the level outright). Which one is encoded in the rule variant, so
//! the escalate-vs-overwrite behavior of every format is visible in one
//! list instead of being spread across independent guards.
//!
//! Classification is deterministic: same message, service, status, method
//! and format always give the same level.

pub mod rules;

use crate::log_sources::{source_for, RawRecord};
use crate::{LogFormat, SeverityLevel};

/// The fields the classifier looks at, with lower-cased copies prepared once.
#[derive(Debug, Clone)]
pub struct RuleInput<'a> {
    pub message: &'a str,
    message_lower: String,
    service_lower: String,
    pub status: Option<u16>,
    pub method: Option<&'a str>,
}

impl<'a> RuleInput<'a> {
    pub fn new(
        message: &'a str,
        service: &str,
        status: Option<u16>,
        method: Option<&'a str>,
    ) -> Self {
        Self {
            message,
            message_lower: message.to_lowercase(),
            service_lower: service.to_lowercase(),
            status,
            method,
        }
    }

    fn message_contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| self.message_lower.contains(kw))
    }
}

impl<'a> From<&'a RawRecord> for RuleInput<'a> {
    fn from(raw: &'a RawRecord) -> Self {
        RuleInput::new(
            raw.message.as_deref().unwrap_or(""),
            raw.service.as_deref().unwrap_or(""),
            raw.status,
            raw.method.as_deref(),
        )
    }
}

/// One step of the classifier.
///
/// Keyword lists are lower-case and matched against the lower-cased
/// message unless a variant says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityRule {
    /// Message contains any keyword -> set `level`.
    Set {
        keywords: &'static [&'static str],
        level: SeverityLevel,
    },

    /// Message contains any keyword and the level is exactly `from` -> `to`.
    EscalateFrom {
        keywords: &'static [&'static str],
        from: SeverityLevel,
        to: SeverityLevel,
    },

    /// Message contains any keyword -> one step up, saturating.
    StepUp { keywords: &'static [&'static str] },

    /// The first group with a matching keyword overwrites the level.
    /// No match leaves the level alone.
    KeywordScan {
        groups: &'static [(&'static [&'static str], SeverityLevel)],
    },

    /// HTTP status ladder, always overwrites:
    /// 5xx critical, 4xx high, POST medium, anything else low.
    HttpResponse,

    /// Service matches (case-insensitive) and the message contains
    /// `needle` -> set `level`. With `case_sensitive` the needle is matched
    /// against the original message text.
    Service {
        service: &'static str,
        needle: &'static str,
        case_sensitive: bool,
        level: SeverityLevel,
    },
}

impl SeverityRule {
    /// Apply this rule to `current`, returning the new level.
    pub fn apply(&self, input: &RuleInput<'_>, current: SeverityLevel) -> SeverityLevel {
        match *self {
            SeverityRule::Set { keywords, level } => {
                if input.message_contains_any(keywords) {
                    level
                } else {
                    current
                }
            }
            SeverityRule::EscalateFrom { keywords, from, to } => {
                if current == from && input.message_contains_any(keywords) {
                    to
                } else {
                    current
                }
            }
            SeverityRule::StepUp { keywords } => {
                if input.message_contains_any(keywords) {
                    current.escalate()
                } else {
                    current
                }
            }
            SeverityRule::KeywordScan { groups } => groups
                .iter()
                .find(|(keywords, _)| input.message_contains_any(keywords))
                .map_or(current, |(_, level)| *level),
            SeverityRule::HttpResponse => match input.status {
                Some(status) if status >= 500 => SeverityLevel::Critical,
                Some(status) if status >= 400 => SeverityLevel::High,
                _ if input.method == Some("POST") => SeverityLevel::Medium,
                _ => SeverityLevel::Low,
            },
            SeverityRule::Service {
                service,
                needle,
                case_sensitive,
                level,
            } => {
                let hit = input.service_lower == service
                    && if case_sensitive {
                        input.message.contains(needle)
                    } else {
                        input.message_lower.contains(needle)
                    };
                if hit {
                    level
                } else {
                    current
                }
            }
        }
    }
}

/// The full ordered rule list for `format`.
pub fn rules_for(format: LogFormat) -> impl Iterator<Item = &'static SeverityRule> {
    rules::GENERIC_RULES
        .iter()
        .chain(source_for(format).severity_rules())
        .chain(rules::SERVICE_RULES)
}

/// Classify one record.
pub fn classify<'a>(record: impl Into<RuleInput<'a>>, format: LogFormat) -> SeverityLevel {
    let input = record.into();
    rules_for(format).fold(SeverityLevel::Low, |level, rule| rule.apply(&input, level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SeverityLevel::*;

    fn msg(message: &str, service: &str, format: LogFormat) -> SeverityLevel {
        classify(RuleInput::new(message, service, None, None), format)
    }

    fn http(status: u16, method: &str) -> SeverityLevel {
        classify(
            RuleInput::new("irrelevant", "Apache2", Some(status), Some(method)),
            LogFormat::ApacheAccess,
        )
    }

    #[test]
    fn test_baseline_low() {
        for format in LogFormat::ALL {
            if format == LogFormat::ApacheAccess {
                continue;
            }
            assert_eq!(msg("all quiet", "app", format), Low);
        }
    }

    #[test]
    fn test_critical_keyword() {
        assert_eq!(msg("CRITICAL: disk on fire", "app", LogFormat::Auth), Critical);
    }

    #[test]
    fn test_error_from_low_goes_high() {
        assert_eq!(msg("Error reading config", "app", LogFormat::Auth), High);
        assert_eq!(msg("job failed", "app", LogFormat::Auth), High);
    }

    #[test]
    fn test_error_does_not_downgrade_critical() {
        assert_eq!(msg("critical error", "app", LogFormat::Auth), Critical);
    }

    #[test]
    fn test_auth_root_is_one_step() {
        assert_eq!(msg("session opened for user root", "su", LogFormat::Auth), Medium);
        assert_eq!(msg("root login failed", "login", LogFormat::Auth), Critical);
        assert_eq!(msg("critical: root", "login", LogFormat::Auth), Critical);
    }

    #[test]
    fn test_root_ignored_outside_auth() {
        assert_eq!(msg("session opened for user root", "su", LogFormat::Syslog), Low);
    }

    #[test]
    fn test_syslog_keyword_scan_overwrites() {
        assert_eq!(msg("kernel panic - not syncing", "kernel", LogFormat::Syslog), Critical);
        assert_eq!(msg("Warning: low memory", "kernel", LogFormat::Syslog), Medium);
        // "info" overwrites the "error" escalation.
        assert_eq!(msg("info: error count reset", "app", LogFormat::Syslog), Low);
        // No keyword: prior level stands.
        assert_eq!(msg("disk error", "app", LogFormat::Syslog), High);
    }

    #[test]
    fn test_syslog_first_group_wins() {
        assert_eq!(msg("alert and warning and info", "app", LogFormat::Syslog), Critical);
        assert_eq!(msg("warning, see info", "app", LogFormat::Syslog), Medium);
    }

    #[test]
    fn test_apache_ladder() {
        assert_eq!(http(503, "GET"), Critical);
        assert_eq!(http(404, "GET"), High);
        assert_eq!(http(200, "POST"), Medium);
        assert_eq!(http(200, "GET"), Low);
    }

    #[test]
    fn test_apache_overwrites_message_rules() {
        let level = classify(
            RuleInput::new("critical failure", "Apache2", Some(200), Some("GET")),
            LogFormat::ApacheAccess,
        );
        assert_eq!(level, Low);
    }

    #[test]
    fn test_sshd_rules() {
        assert_eq!(
            msg("Failed password for admin from 10.0.0.1", "sshd", LogFormat::Auth),
            Medium
        );
        assert_eq!(
            msg("Accepted publickey for git from 10.0.0.1", "SSHD", LogFormat::Syslog),
            High
        );
        assert_eq!(
            msg("failed password then accepted publickey", "sshd", LogFormat::Auth),
            High
        );
    }

    #[test]
    fn test_sshd_overrides_root_escalation() {
        // root escalates High -> Critical, then sshd sets Medium.
        assert_eq!(
            msg("Failed password for root from 10.0.0.1", "sshd", LogFormat::Auth),
            Medium
        );
    }

    #[test]
    fn test_new_session_is_case_sensitive() {
        assert_eq!(
            msg("New session 12 of user deploy.", "systemd-logind", LogFormat::Auth),
            High
        );
        assert_eq!(
            msg("new session 12 of user deploy.", "systemd-logind", LogFormat::Auth),
            Low
        );
        assert_eq!(msg("New session 12", "cron", LogFormat::Auth), Low);
    }

    #[test]
    fn test_rule_order_generic_format_service() {
        let rules: Vec<_> = rules_for(LogFormat::ApacheAccess).collect();
        assert_eq!(rules.len(), rules::GENERIC_RULES.len() + 1 + rules::SERVICE_RULES.len());
        assert_eq!(*rules[rules::GENERIC_RULES.len()], SeverityRule::HttpResponse);
    }
}
