//! Wall clock and media-clock rescaling.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock time for packets whose timestamp is absent.
pub trait Clock: Send {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Compute `value * num / den`, rounding to the nearest integer with halves
/// away from zero. Returns 0 when `den` is 0.
///
/// Used to move timestamps between clocks, e.g. milliseconds to the 90 kHz
/// video clock: `rescale(ms, 90_000, 1_000)`.
pub fn rescale(value: i64, num: i64, den: i64) -> i64 {
    if den == 0 {
        return 0;
    }
    let n = value as i128 * num as i128;
    let d = den as i128;
    let half = d.abs() / 2;
    let rounded = if (n < 0) == (d < 0) {
        (n.abs() + half) / d.abs()
    } else {
        -((n.abs() + half) / d.abs())
    };
    rounded as i64
}
