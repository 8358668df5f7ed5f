//! Building blocks for card hints.
//!
//! The per-format hint sets live with each `LogSource`; these helpers keep
//! the counting rules (case folding, tie breaking) identical across them.

use std::collections::{HashMap, HashSet};

use crate::{CardHint, LogRecord};

/// Number of records satisfying `pred`.
pub fn count_where<F>(records: &[LogRecord], pred: F) -> usize
where
    F: Fn(&LogRecord) -> bool,
{
    records.iter().filter(|r| pred(r)).count()
}

/// Number of distinct values, compared case-insensitively.
pub fn distinct_count<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .map(|v| v.to_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

/// Number of distinct services, using the same folding as the summaries.
pub fn distinct_services(records: &[LogRecord]) -> usize {
    distinct_count(records.iter().map(|r| r.service.as_str()))
}

/// The `n` most frequent values with their counts.
///
/// Equal counts keep first-seen order. Values are compared exactly.
pub fn top_n<'a, I>(values: I, n: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut freq: Vec<(&'a str, usize)> = Vec::new();

    for value in values {
        match index.get(value) {
            Some(&slot) => freq[slot].1 += 1,
            None => {
                index.insert(value, freq.len());
                freq.push((value, 1));
            }
        }
    }

    // sort_by is stable, so ties stay in first-seen order.
    freq.sort_by(|a, b| b.1.cmp(&a.1));
    freq.into_iter()
        .take(n)
        .map(|(value, count)| (value.to_string(), count))
        .collect()
}

/// The "Lines Skipped" hint for malformed input lines.
pub fn skipped_lines_hint(skipped: usize) -> CardHint {
    CardHint::new("Lines Skipped", skipped)
}
