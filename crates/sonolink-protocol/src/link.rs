//! The link seam: a byte-oriented notification send primitive.
//!
//! Everything below this trait (GATT services, MTU exchange, PHY and
//! data-length negotiation, platform stack quirks) belongs to the
//! embedder. The sessions only queue bytes and react to the outcomes.

/// Result of attempting to queue one notification on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Queued in the link stack; a transmit-complete signal follows later.
    Sent,
    /// The stack is congested; retry after a pacing delay.
    Congested,
    /// Any other link failure. Counted; recovery rides the next ACK barrier.
    Failed,
}

/// Byte-oriented notification sink backed by the platform link layer.
///
/// Implementations must consume (or copy) `frame` before returning; the
/// caller reuses the buffer for the next chunk.
pub trait NotificationSink {
    fn send_notification(&mut self, frame: &[u8]) -> SendOutcome;
}
