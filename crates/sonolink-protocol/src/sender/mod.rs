//! Sender-side transfer: pacing, flow control, and the session state
//! machine that fragments blocks into notification-sized chunks.

pub mod constants;
pub mod pacing;
pub mod session;

pub use constants::*;
pub use pacing::PacingState;
pub use session::{SenderSession, SenderState, SenderStats, Tick};
