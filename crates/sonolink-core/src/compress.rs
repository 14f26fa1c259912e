//! Delta + DEFLATE payload codec for compressed waveform blocks.
//!
//! A compressed payload is the zlib-deflated stream of 16-bit little-endian
//! first differences of the block's samples, seeded from zero.

use std::io::Read;

use flate2::Compression;
use flate2::read::{ZlibDecoder, ZlibEncoder};

use crate::constants::{DELTA_STREAM_SIZE, SAMPLES_PER_BLOCK};
use crate::error::BlockError;

/// Delta-encode and deflate a block's samples.
///
/// Fails with [`BlockError::DeltaRange`] when consecutive samples differ
/// by more than a 16-bit delta can carry.
pub fn delta_compress(samples: &[i32]) -> Result<Vec<u8>, BlockError> {
    let mut deltas = Vec::with_capacity(samples.len() * 2);
    let mut prev: i32 = 0;
    for &sample in samples {
        let wide = i64::from(sample) - i64::from(prev);
        let delta = i16::try_from(wide).map_err(|_| BlockError::DeltaRange(wide))?;
        deltas.extend_from_slice(&delta.to_le_bytes());
        prev = sample;
    }

    let mut encoder = ZlibEncoder::new(deltas.as_slice(), Compression::default());
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| BlockError::Compress(e.to_string()))?;
    Ok(compressed)
}

/// Inflate a compressed payload and reconstruct samples by running sum.
///
/// The inflated stream must be exactly [`DELTA_STREAM_SIZE`] bytes.
/// Reconstructed samples are the plain running sum; they are not
/// re-sign-extended or clamped to the 24-bit range.
pub fn delta_decompress(compressed: &[u8]) -> Result<Vec<i32>, BlockError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut deltas = Vec::with_capacity(DELTA_STREAM_SIZE);
    decoder
        .read_to_end(&mut deltas)
        .map_err(|e| BlockError::Decompress(e.to_string()))?;

    if deltas.len() != DELTA_STREAM_SIZE {
        return Err(BlockError::DecompressedSize {
            expected: DELTA_STREAM_SIZE,
            actual: deltas.len(),
        });
    }

    let mut samples = Vec::with_capacity(SAMPLES_PER_BLOCK);
    let mut acc: i32 = 0;
    for pair in deltas.chunks_exact(2) {
        acc += i32::from(i16::from_le_bytes([pair[0], pair[1]]));
        samples.push(acc);
    }
    Ok(samples)
}
