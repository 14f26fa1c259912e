//! Receiver-side transfer: chunk reassembly, block decode, statistics,
//! and acknowledgement cadence.

pub mod reassembly;
pub mod session;
pub mod stats;

pub use reassembly::{ChunkInsert, PartialBlock};
pub use session::{ReceiverEvents, ReceiverSession};
pub use stats::TransferStats;
