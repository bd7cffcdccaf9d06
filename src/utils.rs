/// Utility functions for timestamps and log formatting
use time::{format_description, OffsetDateTime};
use url::Url;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Format seconds since the epoch the same way as `format_datetime`
pub fn format_epoch(seconds: i64) -> String {
    OffsetDateTime::from_unix_timestamp(seconds)
        .map(|dt| format_datetime(&dt))
        .unwrap_or_else(|_| seconds.to_string())
}

/// Current time in seconds since the epoch
pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Hide the password of a station URL before it is logged
pub fn redact_url(url: &Url) -> String {
    if url.password().is_none() {
        return url.to_string();
    }
    let mut redacted = url.clone();
    // Only fails for URLs that cannot carry credentials, which never have a password
    let _ = redacted.set_password(Some("***"));
    redacted.to_string()
}
