//! Field normalizer.
//!
//! Fills `service` and `message` with format-specific defaults so the
//! classifier and aggregator can rely on both being present. Fields that
//! already hold a value are never touched, which makes [`normalize`]
//! idempotent.

use super::{source_for, RawRecord};
use crate::LogFormat;

/// Message used by the syslog-style formats when a line has no message.
pub const NO_MESSAGE: &str = "No message provided";

/// Fill missing `service` / `message` on `raw` for `format`.
pub fn normalize(raw: &mut RawRecord, format: LogFormat) {
    let source = source_for(format);

    if is_blank(&raw.service) {
        raw.service = Some(source.default_service().to_string());
    }
    if is_blank(&raw.message) {
        let message = source.default_message(raw);
        raw.message = Some(message);
    }
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, |s| s.trim().is_empty())
}
