use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod health;
pub mod host;
pub mod phase;
pub mod quiz;
pub mod setup;
pub mod sse;
pub mod validation;

/// Render milliseconds since the epoch as RFC 3339.
fn format_timestamp_ms(millis: u64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|time| time.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}
