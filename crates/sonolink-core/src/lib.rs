//! Wire formats and codecs for the sonolink waveform transfer protocol.
//!
//! Pure, side-effect-free building blocks shared by both peers: chunk and
//! control framing, the waveform block header, 24-bit sample packing,
//! delta/DEFLATE payload compression, and CRC-32 integrity.

pub mod block;
pub mod compress;
pub mod constants;
pub mod error;
pub mod sample;
pub mod types;
pub mod wire;

pub use block::{BlockSource, decode_block, encode_block};
pub use constants::{ControlCommand, TransferMode};
pub use error::{BlockError, WireError};
pub use types::Waveform;
pub use wire::{ChunkHeader, ControlMessage, WaveformHeader};
