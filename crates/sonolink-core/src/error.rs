//! Wire and block codec error types.
//!
//! These are the typed failures of the pure codec layer. At the protocol
//! layer they are counted and the offending input discarded; nothing here
//! is fatal to a session.

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("frame too short: {actual} bytes (minimum {min})")]
    ShortFrame { min: usize, actual: usize },

    #[error("unknown control command: {0:#04x}")]
    BadCommand(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error("block too short: {actual} bytes (minimum {min})")]
    ShortBlock { min: usize, actual: usize },

    #[error("compression failed: {0}")]
    Compress(String),

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("decompressed size mismatch: {actual} bytes (expected {expected})")]
    DecompressedSize { expected: usize, actual: usize },

    #[error("sample delta {0} outside 16-bit range")]
    DeltaRange(i64),

    #[error("compressed block too large: {0} bytes")]
    CompressedTooLarge(usize),

    #[error("sample CRC mismatch: computed {computed:#010x}, header {header:#010x}")]
    CrcMismatch { computed: u32, header: u32 },

    #[error(transparent)]
    Wire(#[from] WireError),
}
