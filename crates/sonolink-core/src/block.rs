//! Waveform block encoding and decoding.
//!
//! A block on the wire is the 38-byte header followed by either the packed
//! 24-bit samples (Raw, zero-padded to the block bound) or the deflated
//! delta stream (Compressed). The receiver infers the encoding from the
//! assembled size: anything below [`BLOCK_SIZE_BOUND`] is compressed.

use crate::compress::{delta_compress, delta_decompress};
use crate::constants::{
    BLOCK_SIZE_BOUND, RAW_BLOCK_SIZE, RAW_SAMPLE_BYTES, SAMPLES_PER_BLOCK, TransferMode,
    WAVEFORM_HEADER_SIZE,
};
use crate::error::BlockError;
use crate::sample::{crc32_samples, pack_samples_into, unpack_samples};
use crate::types::Waveform;
use crate::wire::WaveformHeader;

/// Source of on-wire block bytes on the sending side.
///
/// `fill_block` replaces `out` with the complete wire bytes (header plus
/// payload) for `block`. The session owns the buffer and reuses it across
/// blocks; implementations must not hold on to it.
pub trait BlockSource {
    fn fill_block(&mut self, block: u16, mode: TransferMode, out: &mut Vec<u8>);
}

/// Encode a block for the wire.
///
/// Raw blocks are zero-padded to [`BLOCK_SIZE_BOUND`] so the receiver's
/// size heuristic classifies them correctly; compressed blocks must land
/// below the bound.
pub fn encode_block(
    header: &WaveformHeader,
    samples: &[i32],
    mode: TransferMode,
    out: &mut Vec<u8>,
) -> Result<(), BlockError> {
    debug_assert_eq!(samples.len(), SAMPLES_PER_BLOCK);
    out.clear();
    match mode {
        TransferMode::Raw => {
            out.extend_from_slice(&header.encode());
            pack_samples_into(samples, out);
            out.resize(BLOCK_SIZE_BOUND, 0);
            Ok(())
        }
        TransferMode::Compressed => {
            let payload = delta_compress(samples)?;
            let total = WAVEFORM_HEADER_SIZE + payload.len();
            if total >= BLOCK_SIZE_BOUND {
                return Err(BlockError::CompressedTooLarge(total));
            }
            out.extend_from_slice(&header.encode());
            out.extend_from_slice(&payload);
            Ok(())
        }
    }
}

/// Decode an assembled block.
///
/// Returns the waveform and whether the compressed path was taken.
/// Compressed payloads are CRC-gated against the header; raw payloads
/// pass without a CRC check, matching the deployed receiver.
pub fn decode_block(raw: &[u8]) -> Result<(Waveform, bool), BlockError> {
    if raw.len() < WAVEFORM_HEADER_SIZE {
        return Err(BlockError::ShortBlock {
            min: WAVEFORM_HEADER_SIZE,
            actual: raw.len(),
        });
    }

    if raw.len() < BLOCK_SIZE_BOUND {
        let header = WaveformHeader::decode(raw)?;
        let samples = delta_decompress(&raw[WAVEFORM_HEADER_SIZE..])?;
        let computed = crc32_samples(&samples);
        if computed != header.crc32 {
            return Err(BlockError::CrcMismatch {
                computed,
                header: header.crc32,
            });
        }
        Ok((Waveform { header, samples }, true))
    } else {
        if raw.len() < RAW_BLOCK_SIZE {
            return Err(BlockError::ShortBlock {
                min: RAW_BLOCK_SIZE,
                actual: raw.len(),
            });
        }
        let header = WaveformHeader::decode(raw)?;
        let samples =
            unpack_samples(&raw[WAVEFORM_HEADER_SIZE..WAVEFORM_HEADER_SIZE + RAW_SAMPLE_BYTES]);
        Ok((Waveform { header, samples }, false))
    }
}
