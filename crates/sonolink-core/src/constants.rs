//! Protocol constants and enumerations for the waveform transfer wire format.

use crate::error::WireError;

// Corpus geometry (must match on both peers)
pub const TOTAL_BLOCKS: u16 = 1800;
pub const SAMPLES_PER_BLOCK: usize = 2376;

// Wire sizes
pub const WAVEFORM_HEADER_SIZE: usize = 38;
pub const RAW_SAMPLE_BYTES: usize = SAMPLES_PER_BLOCK * 3;
pub const RAW_BLOCK_SIZE: usize = WAVEFORM_HEADER_SIZE + RAW_SAMPLE_BYTES; // 7166
pub const CHUNK_HEADER_SIZE: usize = 12;
pub const CONTROL_MSG_SIZE: usize = 7;

/// On-wire block bound. Raw blocks are zero-padded up to this size; the
/// receiver treats any assembled block below it as compressed.
pub const BLOCK_SIZE_BOUND: usize = 7168;

/// Size of the inflated delta stream inside a compressed block
/// (one signed 16-bit first difference per sample).
pub const DELTA_STREAM_SIZE: usize = SAMPLES_PER_BLOCK * 2;

/// Cumulative-acknowledgement cadence in blocks.
pub const ACK_INTERVAL: u16 = 20;

/// ATT overhead subtracted from the negotiated MTU when sizing chunks.
pub const ATT_NOTIFY_OVERHEAD: usize = 3;

/// Commands carried on the control characteristic.
///
/// 0x04/0x05 are reserved for a resume query that was never implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlCommand {
    Start = 0x01,
    Stop = 0x02,
    Ack = 0x03,
}

impl ControlCommand {
    pub fn from_u8(v: u8) -> Result<Self, WireError> {
        match v {
            0x01 => Ok(ControlCommand::Start),
            0x02 => Ok(ControlCommand::Stop),
            0x03 => Ok(ControlCommand::Ack),
            other => Err(WireError::BadCommand(other)),
        }
    }
}

/// Payload encoding chosen by the sender for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Packed 24-bit samples, padded to [`BLOCK_SIZE_BOUND`].
    Raw,
    /// Delta-encoded, DEFLATE-compressed sample stream.
    Compressed,
}
