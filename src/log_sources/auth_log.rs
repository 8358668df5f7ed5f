//! Parser for Linux `/var/log/auth.log` (and `/var/log/secure` on RHEL).
//!
//! Lines are read positionally: `timestamp host service[pid]: message`.
//! Anything with fewer than three tokens is dropped.
//!
//! Severity: a message mentioning `root` moves one step up the scale.
//!
//! Copyright (c) 2026 CIPS Corps. All rights reserved.

use crate::aggregate::hints;
use crate::log_sources::{normalize::NO_MESSAGE, split_header, LogSource, RawRecord};
use crate::severity::SeverityRule;
use crate::{CardHint, HintConfig, LogFormat, LogRecord};

const AUTH_RULES: &[SeverityRule] = &[SeverityRule::StepUp { keywords: &["root"] }];

pub struct AuthLogSource;

impl LogSource for AuthLogSource {
    fn format(&self) -> LogFormat {
        LogFormat::Auth
    }

    fn min_tokens(&self) -> usize {
        3
    }

    fn tokenize_line(&self, line: &str) -> Option<RawRecord> {
        let header = split_header(line);
        if header.count < self.min_tokens() {
            return None;
        }
        Some(RawRecord {
            timestamp: header.timestamp,
            host: header.host,
            service: header.service,
            message: header.message,
            ..Default::default()
        })
    }

    fn default_service(&self) -> &'static str {
        "unknown"
    }

    fn default_message(&self, _raw: &mut RawRecord) -> String {
        NO_MESSAGE.to_string()
    }

    fn severity_rules(&self) -> &'static [SeverityRule] {
        AUTH_RULES
    }

    fn card_hints(&self, records: &[LogRecord], _config: &HintConfig) -> Vec<CardHint> {
        let failed_ssh = hints::count_where(records, |r| {
            let msg = r.message.to_lowercase();
            is_service(r, "sshd") && (msg.contains("failed") || msg.contains("invalid"))
        });
        let accepted_ssh = hints::count_where(records, |r| {
            is_service(r, "sshd") && r.message.to_lowercase().contains("accepted")
        });
        let cron_sessions = hints::count_where(records, |r| {
            is_service(r, "cron") && r.message.to_lowercase().contains("session")
        });

        vec![
            CardHint::new("Unique Services", hints::distinct_services(records)),
            CardHint::new("Failed SSH Login Attempts", failed_ssh),
            CardHint::new("Successful SSH Login Attempts", accepted_ssh),
            CardHint::new("CRON Job User Session Events", cron_sessions),
        ]
    }
}

fn is_service(record: &LogRecord, name: &str) -> bool {
    record.service.eq_ignore_ascii_case(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HintValue;

    fn source() -> AuthLogSource {
        AuthLogSource
    }

    #[test]
    fn test_iso_timestamp_line() {
        let line = "2025-06-20T12:59:25.000001+02:00 bastion sshd[31337]: Accepted publickey for deploy from 172.16.0.50 port 60000 ssh2: RSA SHA256:abc";
        let raw = source().tokenize_line(line).expect("should parse");
        assert_eq!(raw.timestamp.as_deref(), Some("2025-06-20T12:59:25.000001+02:00"));
        assert_eq!(raw.host.as_deref(), Some("bastion"));
        assert_eq!(raw.service.as_deref(), Some("sshd"));
        assert_eq!(
            raw.message.as_deref(),
            Some("Accepted publickey for deploy from 172.16.0.50 port 60000 ssh2: RSA SHA256:abc")
        );
    }

    #[test]
    fn test_bsd_timestamp_line() {
        let line = "Jan  5 14:23:01 webserver sudo: deploy : TTY=pts/0 ; USER=root ; COMMAND=/bin/ls";
        let raw = source().tokenize_line(line).expect("should parse");
        assert_eq!(raw.timestamp.as_deref(), Some("Jan  5 14:23:01"));
        assert_eq!(raw.service.as_deref(), Some("sudo"));
        assert!(raw.message.unwrap().starts_with("deploy : TTY=pts/0"));
    }

    #[test]
    fn test_three_tokens_is_enough() {
        let raw = source().tokenize_line("stamp host cron:").expect("should parse");
        assert_eq!(raw.service.as_deref(), Some("cron"));
        assert!(raw.message.is_none());
    }

    #[test]
    fn test_two_tokens_dropped() {
        assert!(source().tokenize_line("stamp host").is_none());
        assert!(source().tokenize_line("garbage").is_none());
    }

    fn record(service: &str, message: &str) -> LogRecord {
        RawRecord {
            timestamp: Some("t".into()),
            service: Some(service.into()),
            message: Some(message.into()),
            ..Default::default()
        }
        .into_record(crate::SeverityLevel::Low)
    }

    #[test]
    fn test_card_hints() {
        let records = vec![
            record("sshd", "Failed password for admin from 1.2.3.4"),
            record("sshd", "Invalid user oracle from 1.2.3.4"),
            record("SSHD", "Accepted publickey for git from 10.0.0.1"),
            record("CRON", "pam_unix(cron:session): session opened for user root"),
            record("systemd-logind", "New session 4 of user deploy."),
        ];
        let hints = source().card_hints(&records, &HintConfig::default());
        let titles: Vec<&str> = hints.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Unique Services",
                "Failed SSH Login Attempts",
                "Successful SSH Login Attempts",
                "CRON Job User Session Events",
            ]
        );
        assert_eq!(hints[0].value, HintValue::Count(3));
        assert_eq!(hints[1].value, HintValue::Count(2));
        assert_eq!(hints[2].value, HintValue::Count(1));
        assert_eq!(hints[3].value, HintValue::Count(1));
    }
}
