//! 24-bit sample packing and CRC-32 integrity.
//!
//! Samples travel as 3-byte little-endian triples and are handled in
//! memory as sign-extended `i32`s. The CRC always covers the packed form,
//! whether computed from bytes or from a sample slice.

/// Pack samples into 3-byte little-endian triples.
///
/// The low 24 bits of each sample are packed as-is; the top byte is not
/// checked for a correct sign extension.
pub fn pack_samples(samples: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 3);
    pack_samples_into(samples, &mut out);
    out
}

/// Append the packed form of `samples` to `out`.
pub fn pack_samples_into(samples: &[i32], out: &mut Vec<u8>) {
    out.reserve(samples.len() * 3);
    for &sample in samples {
        out.extend_from_slice(&sample.to_le_bytes()[..3]);
    }
}

/// Unpack 3-byte little-endian triples into sign-extended samples.
///
/// Trailing bytes that do not form a whole triple are ignored.
pub fn unpack_samples(raw: &[u8]) -> Vec<i32> {
    raw.chunks_exact(3)
        .map(|triple| {
            let value =
                i32::from(triple[0]) | i32::from(triple[1]) << 8 | i32::from(triple[2]) << 16;
            // Sign-extend from bit 23.
            (value << 8) >> 8
        })
        .collect()
}

/// CRC-32 (IEEE, reflected) over a byte range.
pub fn crc32_bytes(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// CRC-32 over the packed 24-bit form of `samples`.
///
/// Equal to `crc32_bytes(&pack_samples(samples))` without materializing
/// the packed buffer.
pub fn crc32_samples(samples: &[i32]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for &sample in samples {
        hasher.update(&sample.to_le_bytes()[..3]);
    }
    hasher.finalize()
}
