//! Sender pacing and flow-control constants.

use std::time::Duration;

/// Fastest inter-chunk delay; matches the requested connection interval.
pub const MIN_DELAY_MS: u16 = 15;

/// Slowest inter-chunk delay under sustained congestion.
pub const MAX_DELAY_MS: u16 = 50;

/// Delay at session start and after reset.
pub const INITIAL_DELAY_MS: u16 = 15;

/// Added to the delay while congestion persists.
pub const BACKOFF_INCREMENT_MS: u16 = 5;

/// Subtracted from the delay after sustained success.
pub const SPEEDUP_DECREMENT_MS: u16 = 1;

/// Consecutive congested sends before backing off.
pub const CONGESTION_THRESHOLD: u16 = 3;

/// Consecutive successful sends before speeding up.
pub const SUCCESS_THRESHOLD: u16 = 50;

/// Maximum notifications queued in the link stack at once.
pub const MAX_IN_FLIGHT: u8 = 2;

/// Congestion warnings are throttled to one per this interval.
pub const CONGESTION_REPORT_INTERVAL: Duration = Duration::from_secs(5);
