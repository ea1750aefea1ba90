//! Wall-clock helpers.
//!
//! All entry metadata is stamped in epoch milliseconds so timestamps can be
//! stored in plain `u64` atomics and subtracted without conversion.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[inline]
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Hour of day (UTC) in `[0, 24)` for an epoch-millisecond timestamp.
#[inline]
pub(crate) fn hour_of_day(millis: u64) -> u64 {
    (millis / 3_600_000) % 24
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_nonzero_and_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(a > 0);
        assert!(b >= a);
    }

    #[test]
    fn hour_of_day_wraps_at_24() {
        assert_eq!(hour_of_day(0), 0);
        assert_eq!(hour_of_day(3_600_000), 1);
        assert_eq!(hour_of_day(24 * 3_600_000), 0);
        assert_eq!(hour_of_day(25 * 3_600_000 + 42), 1);
    }
}
