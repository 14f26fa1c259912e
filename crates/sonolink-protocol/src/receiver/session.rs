//! Receiver transfer session: chunk ingest, reassembly, decode, and
//! callback dispatch.
//!
//! The session runs on the link's notification-delivery context. Framing
//! and decode failures are counted and the offending input dropped; the
//! sender's resume-from-ACK machinery retransmits anything that never
//! completes.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use sonolink_core::Waveform;
use sonolink_core::block::decode_block;
use sonolink_core::constants::{ACK_INTERVAL, CHUNK_HEADER_SIZE, TOTAL_BLOCKS};
use sonolink_core::wire::ChunkHeader;

use super::reassembly::{ChunkInsert, PartialBlock};
use super::stats::TransferStats;

/// Observer hooks invoked from within [`ReceiverSession::process_chunk`].
///
/// Handlers run on the notification-delivery context and should be short.
/// They may write back to the link (the ACK hook) but must not re-enter
/// the session.
pub trait ReceiverEvents {
    /// A block decoded successfully.
    fn on_waveform(&mut self, waveform: &Waveform, compressed: bool) {
        let _ = (waveform, compressed);
    }

    /// Statistics snapshot after every completed block.
    fn on_progress(&mut self, stats: &TransferStats) {
        let _ = stats;
    }

    /// The full corpus arrived; fired at most once per session.
    fn on_complete(&mut self, stats: &TransferStats) {
        let _ = stats;
    }

    /// A cumulative ACK through `block` is due on the control channel.
    fn on_ack_due(&mut self, block: u16) {
        let _ = block;
    }
}

/// Central-side transfer session.
pub struct ReceiverSession<E> {
    events: E,
    active: bool,
    started_at: Option<Instant>,
    partials: HashMap<u16, PartialBlock>,
    completed: HashSet<u16>,
    completion_reported: bool,
    total_bytes: u64,
    total_chunks: u64,
    frame_errors: u64,
    decode_errors: u64,
    duplicate_chunks: u64,
}

impl<E: ReceiverEvents> ReceiverSession<E> {
    pub fn new(events: E) -> Self {
        Self {
            events,
            active: false,
            started_at: None,
            partials: HashMap::new(),
            completed: HashSet::new(),
            completion_reported: false,
            total_bytes: 0,
            total_chunks: 0,
            frame_errors: 0,
            decode_errors: 0,
            duplicate_chunks: 0,
        }
    }

    /// Begin (or restart) a receive session, discarding prior progress.
    pub fn start(&mut self) {
        self.active = true;
        self.started_at = Some(Instant::now());
        self.partials.clear();
        self.completed.clear();
        self.completion_reported = false;
        self.total_bytes = 0;
        self.total_chunks = 0;
        self.frame_errors = 0;
        self.decode_errors = 0;
        self.duplicate_chunks = 0;
        tracing::info!(total_blocks = TOTAL_BLOCKS, "receive session started");
    }

    /// Stop the session. Buffered partials are discarded; counters and
    /// the completed set survive until the next `start()`.
    pub fn stop(&mut self) {
        self.active = false;
        self.partials.clear();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Ingest one data notification.
    ///
    /// Partial state survives disconnects; only `start()` resets it.
    pub fn process_chunk(&mut self, data: &[u8]) {
        let header = match ChunkHeader::decode(data) {
            Ok(header) => header,
            Err(err) => {
                self.frame_errors += 1;
                tracing::warn!(%err, len = data.len(), "chunk frame rejected");
                return;
            }
        };

        if header.block_number >= TOTAL_BLOCKS {
            self.frame_errors += 1;
            tracing::warn!(block = header.block_number, "block index out of range");
            return;
        }
        if header.total_chunks == 0 {
            self.frame_errors += 1;
            tracing::warn!(block = header.block_number, "zero total_chunks");
            return;
        }

        // Late or retransmitted chunks for blocks we already hold are
        // dropped; completion must fire exactly once per block.
        if self.completed.contains(&header.block_number) {
            self.duplicate_chunks += 1;
            tracing::trace!(block = header.block_number, "chunk for completed block dropped");
            return;
        }

        // Payload: `chunk_size` bytes after the header, clamped to the
        // frame length.
        let end = (CHUNK_HEADER_SIZE + usize::from(header.chunk_size)).min(data.len());
        let payload = &data[CHUNK_HEADER_SIZE..end];

        let (outcome, complete) = {
            let partial = self
                .partials
                .entry(header.block_number)
                .or_insert_with(|| PartialBlock::new(header.total_chunks));
            let outcome = partial.insert(header.chunk_number, header.total_chunks, payload);
            (outcome, partial.is_complete())
        };

        match outcome {
            ChunkInsert::New => {
                self.total_chunks += 1;
                self.total_bytes += payload.len() as u64;
            }
            ChunkInsert::Duplicate => {
                self.duplicate_chunks += 1;
            }
            ChunkInsert::TotalMismatch => {
                // Chunks within a block must agree on the chunk count; the
                // whole block is abandoned and will be retransmitted.
                self.decode_errors += 1;
                self.partials.remove(&header.block_number);
                tracing::warn!(
                    block = header.block_number,
                    "total_chunks mismatch, block dropped"
                );
                return;
            }
            ChunkInsert::OutOfRange => {
                self.frame_errors += 1;
                tracing::warn!(
                    block = header.block_number,
                    chunk = header.chunk_number,
                    "chunk index out of range"
                );
                return;
            }
        }

        if complete && let Some(partial) = self.partials.remove(&header.block_number) {
            self.finish_block(header.block_number, &partial);
        }
    }

    fn finish_block(&mut self, block: u16, partial: &PartialBlock) {
        let bytes = partial.assemble();

        let (waveform, compressed) = match decode_block(&bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.decode_errors += 1;
                tracing::warn!(block, size = bytes.len(), %err, "block decode failed, dropped");
                return;
            }
        };

        self.completed.insert(block);
        tracing::debug!(block, size = bytes.len(), compressed, "block complete");
        self.events.on_waveform(&waveform, compressed);

        if block > 0 && (block + 1).is_multiple_of(ACK_INTERVAL) {
            tracing::debug!(block, "cumulative ack due");
            self.events.on_ack_due(block);
        }

        let stats = self.stats();
        self.events.on_progress(&stats);

        if self.completed.len() == usize::from(TOTAL_BLOCKS) && !self.completion_reported {
            self.completion_reported = true;
            self.active = false;
            let final_stats = self.stats();
            tracing::info!(
                blocks = final_stats.blocks_received,
                bytes = final_stats.total_bytes_received,
                "transfer complete"
            );
            self.events.on_complete(&final_stats);
        }
    }

    /// Snapshot the current statistics.
    pub fn stats(&self) -> TransferStats {
        let elapsed_seconds = match (self.active, self.started_at) {
            (true, Some(started)) => started.elapsed().as_secs_f64(),
            _ => 0.0,
        };
        let throughput_kbps = if elapsed_seconds > 0.0 {
            self.total_bytes as f64 / elapsed_seconds / 1000.0
        } else {
            0.0
        };
        TransferStats {
            blocks_received: self.completed.len() as u32,
            total_blocks: u32::from(TOTAL_BLOCKS),
            total_bytes_received: self.total_bytes,
            total_chunks_received: self.total_chunks,
            elapsed_seconds,
            throughput_kbps,
            progress_percent: self.completed.len() as f64 * 100.0 / f64::from(TOTAL_BLOCKS),
            frame_errors: self.frame_errors,
            decode_errors: self.decode_errors,
            duplicate_chunks: self.duplicate_chunks,
        }
    }

    pub fn completed_blocks(&self) -> usize {
        self.completed.len()
    }

    pub fn pending_blocks(&self) -> usize {
        self.partials.len()
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }
}
