//! Receiver statistics snapshot.

/// Point-in-time transfer statistics handed to progress and completion
/// callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferStats {
    pub blocks_received: u32,
    pub total_blocks: u32,
    pub total_bytes_received: u64,
    pub total_chunks_received: u64,
    /// Seconds since `start()` while the session is active; 0 once
    /// inactive.
    pub elapsed_seconds: f64,
    /// `total_bytes_received / elapsed_seconds / 1000`; 0 when elapsed
    /// is 0.
    pub throughput_kbps: f64,
    pub progress_percent: f64,
    pub frame_errors: u64,
    pub decode_errors: u64,
    pub duplicate_chunks: u64,
}
