//! Protocol state machines for the sonolink waveform transfer.
//!
//! This crate implements the stateful protocol logic on both peers: the
//! sending session with adaptive pacing and credit-based flow control, and
//! the receiving session with chunk reassembly, payload validation, and
//! cumulative-acknowledgement cadence.
//!
//! Both sessions are single-threaded and driver-owned: the embedder calls
//! into them from one execution context per session and forwards link
//! events (transmit-complete, control writes, disconnects) as they arrive.

pub mod error;
pub mod link;
pub mod receiver;
pub mod sender;

pub use error::SessionError;
pub use link::{NotificationSink, SendOutcome};
pub use receiver::{ReceiverEvents, ReceiverSession, TransferStats};
pub use sender::{PacingState, SenderSession, SenderState, SenderStats, Tick};
