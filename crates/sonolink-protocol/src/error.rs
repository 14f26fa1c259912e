//! Session error types.
//!
//! Only lifecycle preconditions surface as errors; runtime protocol
//! failures (framing, decode, link congestion) are counted in statistics
//! and never abort a session.

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("notifications not enabled on the data characteristic")]
    NotificationsDisabled,

    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
}
