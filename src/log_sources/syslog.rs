//! Generic syslog parser -- the fallback.
//!
//! Handles standard syslog format: "Mon DD HH:MM:SS hostname process[PID]: message".
//! Only two tokens are required; lines without a process token get their
//! service and message from the normalizer.
//!
//! Copyright (c) 2026 CIPS Corps. All rights reserved.

use crate::aggregate::hints;
use crate::log_sources::{normalize::NO_MESSAGE, split_header, LogSource, RawRecord};
use crate::severity::SeverityRule;
use crate::{CardHint, HintConfig, LogFormat, LogRecord, SeverityLevel};

/// Priority keywords, first matching group wins.
const PRIORITY_GROUPS: &[(&[&str], SeverityLevel)] = &[
    (&["emerg", "panic", "alert", "crit"], SeverityLevel::Critical),
    (&["warn", "warning"], SeverityLevel::Medium),
    (&["notice", "info"], SeverityLevel::Low),
];

const SYSLOG_RULES: &[SeverityRule] = &[SeverityRule::KeywordScan {
    groups: PRIORITY_GROUPS,
}];

const ERROR_KEYWORDS: &[&str] = &["error", "fail"];

pub struct SyslogSource;

impl LogSource for SyslogSource {
    fn format(&self) -> LogFormat {
        LogFormat::Syslog
    }

    fn min_tokens(&self) -> usize {
        2
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
        SYSLOG_RULES
    }

    fn card_hints(&self, records: &[LogRecord], _config: &HintConfig) -> Vec<CardHint> {
        let kernel = hints::count_where(records, |r| r.service.eq_ignore_ascii_case("kernel"));
        let errors = hints::count_where(records, |r| {
            let msg = r.message.to_lowercase();
            ERROR_KEYWORDS.iter().any(|kw| msg.contains(kw))
        });

        vec![
            CardHint::new("Unique Services", hints::distinct_services(records)),
            CardHint::new(
                "Unique Hosts",
                hints::distinct_count(records.iter().filter_map(|r| r.host.as_deref())),
            ),
            CardHint::new("Kernel Messages", kernel),
            CardHint::new("Error Events", errors),
        ]
    }
}
