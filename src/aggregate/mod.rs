//! # Aggregator
//!
//! Groups classified records by service and counts them per severity.
//! Summaries are always rebuilt from the complete record set, so a dropped
//! line can only ever omit its own contribution.

pub mod hints;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{LogRecord, SeverityLevel};

/// Per-severity counters. All four always exist and start at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
}

impl SeverityCounts {
    pub fn get(&self, level: SeverityLevel) -> u64 {
        match level {
            SeverityLevel::Low => self.low,
            SeverityLevel::Medium => self.medium,
            SeverityLevel::High => self.high,
            SeverityLevel::Critical => self.critical,
        }
    }

    pub fn increment(&mut self, level: SeverityLevel) {
        match level {
            SeverityLevel::Low => self.low += 1,
            SeverityLevel::Medium => self.medium += 1,
            SeverityLevel::High => self.high += 1,
            SeverityLevel::Critical => self.critical += 1,
        }
    }

    /// Sum over all four levels.
    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high + self.critical
    }

    fn add(&mut self, other: &SeverityCounts) {
        self.low += other.low;
        self.medium += other.medium;
        self.high += other.high;
        self.critical += other.critical;
    }
}

/// One row per distinct lower-cased service name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub service: String,
    pub counts: SeverityCounts,
}

impl ServiceSummary {
    /// All events logged by this service.
    pub fn logged_events(&self) -> u64 {
        self.counts.total()
    }
}

/// The grand-total row across every service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityTotals {
    pub records: u64,
    pub counts: SeverityCounts,
}

/// Group `records` by lower-cased service, in first-seen order.
pub fn summarize_services(records: &[LogRecord]) -> Vec<ServiceSummary> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut summaries: Vec<ServiceSummary> = Vec::new();

    for record in records {
        let key = record.service.to_lowercase();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            summaries.push(ServiceSummary {
                service: key,
                counts: SeverityCounts::default(),
            });
            summaries.len() - 1
        });
        summaries[slot].counts.increment(record.severity);
    }

    summaries
}

/// Sum every summary into the total row.
pub fn totals(summaries: &[ServiceSummary]) -> SeverityTotals {
    let mut totals = SeverityTotals::default();
    for summary in summaries {
        totals.counts.add(&summary.counts);
    }
    totals.records = totals.counts.total();
    totals
}
