//! Chunk, control, and waveform-block header wire formats.
//!
//! All multi-byte fields are little-endian, packed at fixed offsets. The
//! layouts are bit-exact contracts between the peripheral and the central;
//! reserved regions are written as zero and skipped on decode.

use crate::constants::{
    CHUNK_HEADER_SIZE, CONTROL_MSG_SIZE, ControlCommand, WAVEFORM_HEADER_SIZE,
};
use crate::error::WireError;

// ---------------------------------------------------------------------------
// Chunk header
// ---------------------------------------------------------------------------

/// Header prepended to every data notification.
///
/// Layout: `block_number(2) || chunk_number(2) || chunk_size(2) ||
/// total_chunks(2) || reserved(4)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct ChunkHeader {
    pub block_number: u16,
    pub chunk_number: u16,
    /// Payload bytes following the header in this notification.
    pub chunk_size: u16,
    /// Chunk count for the whole block; constant within a block.
    pub total_chunks: u16,
}

impl ChunkHeader {
    pub fn encode(&self) -> [u8; CHUNK_HEADER_SIZE] {
        let mut buf = [0u8; CHUNK_HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.block_number.to_le_bytes());
        buf[2..4].copy_from_slice(&self.chunk_number.to_le_bytes());
        buf[4..6].copy_from_slice(&self.chunk_size.to_le_bytes());
        buf[6..8].copy_from_slice(&self.total_chunks.to_le_bytes());
        buf
    }

    pub fn decode(raw: &[u8]) -> Result<Self, WireError> {
        if raw.len() < CHUNK_HEADER_SIZE {
            return Err(WireError::ShortFrame {
                min: CHUNK_HEADER_SIZE,
                actual: raw.len(),
            });
        }
        Ok(Self {
            block_number: u16::from_le_bytes([raw[0], raw[1]]),
            chunk_number: u16::from_le_bytes([raw[2], raw[3]]),
            chunk_size: u16::from_le_bytes([raw[4], raw[5]]),
            total_chunks: u16::from_le_bytes([raw[6], raw[7]]),
        })
    }
}

// ---------------------------------------------------------------------------
// Control message
// ---------------------------------------------------------------------------

/// One message on the control characteristic.
///
/// Layout: `command(1) || block_number(2) || timestamp(4)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct ControlMessage {
    pub command: ControlCommand,
    pub block_number: u16,
    pub timestamp: u32,
}

impl ControlMessage {
    pub fn start(timestamp: u32) -> Self {
        Self {
            command: ControlCommand::Start,
            block_number: 0,
            timestamp,
        }
    }

    pub fn stop(timestamp: u32) -> Self {
        Self {
            command: ControlCommand::Stop,
            block_number: 0,
            timestamp,
        }
    }

    /// Cumulative acknowledgement of every block up to and including
    /// `block_number`.
    pub fn ack(block_number: u16, timestamp: u32) -> Self {
        Self {
            command: ControlCommand::Ack,
            block_number,
            timestamp,
        }
    }

    pub fn encode(&self) -> [u8; CONTROL_MSG_SIZE] {
        let mut buf = [0u8; CONTROL_MSG_SIZE];
        buf[0] = self.command as u8;
        buf[1..3].copy_from_slice(&self.block_number.to_le_bytes());
        buf[3..7].copy_from_slice(&self.timestamp.to_le_bytes());
        buf
    }

    pub fn decode(raw: &[u8]) -> Result<Self, WireError> {
        if raw.len() < CONTROL_MSG_SIZE {
            return Err(WireError::ShortFrame {
                min: CONTROL_MSG_SIZE,
                actual: raw.len(),
            });
        }
        Ok(Self {
            command: ControlCommand::from_u8(raw[0])?,
            block_number: u16::from_le_bytes([raw[1], raw[2]]),
            timestamp: u32::from_le_bytes([raw[3], raw[4], raw[5], raw[6]]),
        })
    }
}

// ---------------------------------------------------------------------------
// Waveform block header
// ---------------------------------------------------------------------------

/// The 38-byte header at the front of every waveform block.
///
/// | Offset | Size | Field            |
/// |--------|------|------------------|
/// | 0      | 4    | block_number     |
/// | 4      | 4    | timestamp_ms     |
/// | 8      | 4    | sample_rate_hz   |
/// | 12     | 2    | sample_count     |
/// | 16     | 2    | trigger_sample   |
/// | 18     | 4    | pulse_freq_hz    |
/// | 26     | 2    | temperature_cx10 |
/// | 28     | 1    | gain_db          |
/// | 30     | 4    | crc32            |
///
/// `crc32` covers the packed 24-bit form of the decoded samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct WaveformHeader {
    pub block_number: u32,
    pub timestamp_ms: u32,
    pub sample_rate_hz: u32,
    pub sample_count: u16,
    /// Index of the excitation trigger within the block.
    pub trigger_sample: u16,
    pub pulse_freq_hz: u32,
    /// Signed temperature in tenths of a degree Celsius.
    pub temperature_cx10: i16,
    pub gain_db: u8,
    pub crc32: u32,
}

impl WaveformHeader {
    pub fn encode(&self) -> [u8; WAVEFORM_HEADER_SIZE] {
        let mut buf = [0u8; WAVEFORM_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.block_number.to_le_bytes());
        buf[4..8].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        buf[8..12].copy_from_slice(&self.sample_rate_hz.to_le_bytes());
        buf[12..14].copy_from_slice(&self.sample_count.to_le_bytes());
        buf[16..18].copy_from_slice(&self.trigger_sample.to_le_bytes());
        buf[18..22].copy_from_slice(&self.pulse_freq_hz.to_le_bytes());
        buf[26..28].copy_from_slice(&self.temperature_cx10.to_le_bytes());
        buf[28] = self.gain_db;
        buf[30..34].copy_from_slice(&self.crc32.to_le_bytes());
        buf
    }

    pub fn decode(raw: &[u8]) -> Result<Self, WireError> {
        if raw.len() < WAVEFORM_HEADER_SIZE {
            return Err(WireError::ShortFrame {
                min: WAVEFORM_HEADER_SIZE,
                actual: raw.len(),
            });
        }
        Ok(Self {
            block_number: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            timestamp_ms: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
            sample_rate_hz: u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]),
            sample_count: u16::from_le_bytes([raw[12], raw[13]]),
            trigger_sample: u16::from_le_bytes([raw[16], raw[17]]),
            pulse_freq_hz: u32::from_le_bytes([raw[18], raw[19], raw[20], raw[21]]),
            temperature_cx10: i16::from_le_bytes([raw[26], raw[27]]),
            gain_db: raw[28],
            crc32: u32::from_le_bytes([raw[30], raw[31], raw[32], raw[33]]),
        })
    }
}
