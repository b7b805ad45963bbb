//! UTC time helpers.
//!
//! All DocuVault subsystems timestamp data in UTC; this module is the single
//! place that talks to the system clock so tests and callers agree on the
//! representation.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Returns the current UTC time.
#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Formats a timestamp as RFC 3339 for logs and wire payloads.
///
/// Falls back to the `Debug` rendering if formatting fails (it cannot for
/// valid `OffsetDateTime` values, but the formatter API is fallible).
#[must_use]
pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| format!("{ts:?}"))
}
