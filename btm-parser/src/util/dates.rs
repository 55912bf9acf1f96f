/*!
 Contains date conversion helpers for Apple's reference-date timestamps.
*/

use chrono::{DateTime, Utc};

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z, the reference date used by `NSDate`
pub const APPLE_EPOCH_OFFSET: i64 = 978_307_200;

/// Convert seconds since the Apple reference date into a UTC timestamp
///
/// Returns [`None`] for non-finite values or dates chrono cannot represent.
pub fn from_apple_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);
    let unix = (whole as i64).checked_add(APPLE_EPOCH_OFFSET)?;
    DateTime::from_timestamp(unix, nanos)
}
