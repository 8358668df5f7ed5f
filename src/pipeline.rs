//! # Pipeline
//!
//! The single entry point: raw text + format in, records, per-service
//! summaries, totals and card hints out.
//!
//! ```text
//! tokenize -> normalize -> classify -> summarize -> hints
//! ```
//!
//! Every call returns freshly built output; nothing is kept between runs.

use serde::Serialize;

use crate::aggregate::{self, hints, ServiceSummary, SeverityTotals};
use crate::log_sources::{self, source_for};
use crate::severity;
use crate::{CardHint, HintConfig, LogFormat, LogRecord, SiftConfig, SiftError, SiftResult};

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutput {
    pub format: LogFormat,
    pub records: Vec<LogRecord>,
    pub summaries: Vec<ServiceSummary>,
    pub totals: SeverityTotals,
    pub hints: Vec<CardHint>,
    /// Non-blank lines dropped for having too few tokens.
    pub skipped_lines: usize,
}

/// A configured pipeline. Holds only options, never run state.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    hints: HintConfig,
}

impl Pipeline {
    pub fn new(hints: HintConfig) -> Self {
        Self { hints }
    }

    pub fn from_config(config: &SiftConfig) -> Self {
        Self::new(config.hints.clone())
    }

    /// Parse, classify and aggregate `raw_text` as `format`.
    ///
    /// Fails with [`SiftError::EmptyInput`] when the text is blank.
    pub fn run(&self, raw_text: &str, format: LogFormat) -> SiftResult<ParseOutput> {
        if raw_text.trim().is_empty() {
            return Err(SiftError::EmptyInput("no log text provided".to_string()));
        }

        let source = source_for(format);
        let tokenized = log_sources::tokenize(raw_text, format);

        let records: Vec<LogRecord> = tokenized
            .records
            .into_iter()
            .map(|mut raw| {
                log_sources::normalize(&mut raw, format);
                let level = severity::classify(&raw, format);
                raw.into_record(level)
            })
            .collect();

        let summaries = aggregate::summarize_services(&records);
        let totals = aggregate::totals(&summaries);

        let mut card_hints = source.card_hints(&records, &self.hints);
        if self.hints.report_skipped_lines {
            card_hints.push(hints::skipped_lines_hint(tokenized.skipped));
        }

        if tokenized.skipped > 0 {
            log::warn!(
                "Skipped {} malformed {} line(s)",
                tokenized.skipped,
                format
            );
        }
        log::info!(
            "Parsed {} {} record(s) across {} service(s): {} medium, {} high, {} critical",
            records.len(),
            format,
            summaries.len(),
            totals.counts.medium,
            totals.counts.high,
            totals.counts.critical,
        );

        Ok(ParseOutput {
            format,
            records,
            summaries,
            totals,
            hints: card_hints,
            skipped_lines: tokenized.skipped,
        })
    }

    /// Like [`Pipeline::run`] but resolves a format tag first.
    pub fn run_tagged(&self, raw_text: &str, tag: &str) -> SiftResult<ParseOutput> {
        let format: LogFormat = tag.parse()?;
        self.run(raw_text, format)
    }
}

/// Parse with default options.
pub fn parse(raw_text: &str, format: LogFormat) -> SiftResult<ParseOutput> {
    Pipeline::default().run(raw_text, format)
}

/// Parse with default options, resolving `tag` ("auth.log", "syslog",
/// "apache_access"). Unknown tags fail with [`SiftError::UnsupportedFormat`].
pub fn parse_tagged(raw_text: &str, tag: &str) -> SiftResult<ParseOutput> {
    Pipeline::default().run_tagged(raw_text, tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HintValue, SeverityLevel};

    const AUTH_SAMPLE: &str = "\
2025-06-20T12:59:25.000001+02:00 bastion sshd[100]: Accepted publickey for git from 10.0.0.9 port 4000 ssh2
2025-06-20T12:59:26.000001+02:00 bastion sshd[101]: Failed password for root from 10.0.0.8 port 4001 ssh2
2025-06-20T13:00:01.000001+02:00 bastion CRON[200]: pam_unix(cron:session): session opened for user root
2025-06-20T13:00:02.000001+02:00 bastion systemd-logind[1]: New session 7 of user deploy.
short line
";

    #[test]
    fn test_auth_run() {
        let out = parse(AUTH_SAMPLE, LogFormat::Auth).expect("parse");
        assert_eq!(out.records.len(), 4);
        assert_eq!(out.skipped_lines, 1);

        let levels: Vec<SeverityLevel> = out.records.iter().map(|r| r.severity).collect();
        assert_eq!(
            levels,
            vec![
                SeverityLevel::High,
                SeverityLevel::Medium,
                SeverityLevel::Medium,
                SeverityLevel::High,
            ]
        );

        let services: Vec<&str> = out.summaries.iter().map(|s| s.service.as_str()).collect();
        assert_eq!(services, vec!["sshd", "cron", "systemd-logind"]);
        assert_eq!(out.totals.records, 4);

        let skipped = out.hints.last().expect("hint");
        assert_eq!(skipped.title, "Lines Skipped");
        assert_eq!(skipped.value, HintValue::Count(1));
    }

    #[test]
    fn test_skipped_hint_can_be_disabled() {
        let pipeline = Pipeline::new(HintConfig {
            report_skipped_lines: false,
            ..Default::default()
        });
        let out = pipeline.run(AUTH_SAMPLE, LogFormat::Auth).expect("parse");
        assert!(out.hints.iter().all(|h| h.title != "Lines Skipped"));
        assert_eq!(out.skipped_lines, 1);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(parse("", LogFormat::Syslog), Err(SiftError::EmptyInput(_))));
        assert!(matches!(parse(" \n\t\n", LogFormat::Syslog), Err(SiftError::EmptyInput(_))));
    }

    #[test]
    fn test_unsupported_tag_rejected() {
        let err = parse_tagged("a b c", "windows_event").unwrap_err();
        assert!(matches!(err, SiftError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_runs_are_independent() {
        let pipeline = Pipeline::default();
        let first = pipeline.run(AUTH_SAMPLE, LogFormat::Auth).expect("parse");
        let second = pipeline
            .run("Jan  1 00:00:00 box kernel: hello", LogFormat::Syslog)
            .expect("parse");
        assert_eq!(first.records.len(), 4);
        assert_eq!(second.records.len(), 1);
        assert_eq!(second.summaries.len(), 1);
        assert_eq!(second.format, LogFormat::Syslog);
    }

    #[test]
    fn test_all_lines_malformed_is_not_an_error() {
        let out = parse("x\ny\n", LogFormat::Auth).expect("parse");
        assert!(out.records.is_empty());
        assert!(out.summaries.is_empty());
        assert_eq!(out.skipped_lines, 2);
    }
}
