//! Rules shared by every format.
//!
//! Format-specific rules live next to each parser in `log_sources`.

use super::SeverityRule;
use crate::SeverityLevel;

/// Evaluated first, for every format.
pub const GENERIC_RULES: &[SeverityRule] = &[
    SeverityRule::Set {
        keywords: &["critical"],
        level: SeverityLevel::Critical,
    },
    SeverityRule::EscalateFrom {
        keywords: &["error", "fail"],
        from: SeverityLevel::Low,
        to: SeverityLevel::High,
    },
];

/// Evaluated last, for every format. Later entries win.
pub const SERVICE_RULES: &[SeverityRule] = &[
    // Case-sensitive: only logind's own "New session" capitalization matches.
    SeverityRule::Service {
        service: "systemd-logind",
        needle: "New session",
        case_sensitive: true,
        level: SeverityLevel::High,
    },
    SeverityRule::Service {
        service: "sshd",
        needle: "failed password",
        case_sensitive: false,
        level: SeverityLevel::Medium,
    },
    SeverityRule::Service {
        service: "sshd",
        needle: "accepted publickey",
        case_sensitive: false,
        level: SeverityLevel::High,
    },
];
