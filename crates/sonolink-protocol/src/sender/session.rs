//! Sender transfer session state machine.
//!
//! The session fragments blocks into MTU-sized chunks and paces them onto
//! the link, honoring cumulative acknowledgements every [`ACK_INTERVAL`]
//! blocks. Disconnects pause the session in place; reconnection rewinds to
//! the last cumulative ACK and retransmits the un-acknowledged window. The
//! receiver is idempotent on duplicate blocks, so the rewind is safe.
//!
//! All operations run on the sender's serialized execution context: one
//! driver task ticks [`SenderSession::process_next_chunk`] and forwards
//! link events between ticks.

use std::time::Instant;

use sonolink_core::block::BlockSource;
use sonolink_core::constants::{
    ACK_INTERVAL, ATT_NOTIFY_OVERHEAD, CHUNK_HEADER_SIZE, ControlCommand, TOTAL_BLOCKS,
    TransferMode,
};
use sonolink_core::wire::{ChunkHeader, ControlMessage};

use super::constants::CONGESTION_REPORT_INTERVAL;
use super::pacing::PacingState;
use crate::error::SessionError;
use crate::link::{NotificationSink, SendOutcome};

/// Default ATT MTU before the exchange completes.
const DEFAULT_MTU: u16 = 23;

/// Lifecycle states of a sender session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Idle,
    Active,
    WaitingAck,
    Paused,
    Complete,
}

impl SenderState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Active => "Active",
            Self::WaitingAck => "WaitingAck",
            Self::Paused => "Paused",
            Self::Complete => "Complete",
        }
    }
}

/// Outcome of one driver tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to do (idle or paused).
    Idle,
    /// One chunk queued on the link.
    Sent,
    /// Still active but nothing sent (no credits or link congested);
    /// retry after [`SenderSession::recommended_delay`].
    Blocked,
    /// At an ACK barrier; waiting for the receiver's cumulative ACK.
    AwaitingAck,
    /// Every block has been sent.
    Complete,
}

/// Cumulative sender-side transfer counters.
#[derive(Debug, Clone, Default)]
pub struct SenderStats {
    pub blocks_sent: u16,
    pub total_chunks: u64,
    pub total_bytes: u64,
    pub send_failures: u32,
    pub congestion_events: u32,
    pub disconnections: u32,
    /// Blocks re-queued by a resume rewind.
    pub retransmits: u32,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl SenderStats {
    /// Average payload throughput since start, in kilobits per second.
    pub fn throughput_kbps(&self) -> f64 {
        let Some(start) = self.started_at else {
            return 0.0;
        };
        let end = self.finished_at.unwrap_or_else(Instant::now);
        let secs = (end - start).as_secs_f64();
        if secs > 0.0 {
            (self.total_bytes as f64 * 8.0) / secs / 1000.0
        } else {
            0.0
        }
    }
}

/// Peripheral-side transfer session.
pub struct SenderSession<S, L> {
    source: S,
    link: L,
    mode: TransferMode,
    state: SenderState,
    notifications_enabled: bool,
    mtu: u16,
    chunk_payload: usize,
    cur_block: u16,
    cur_chunk: u16,
    last_acked_block: u16,
    /// On-wire bytes of the block currently being chunked. Owned by the
    /// session and refilled in place; the link must copy frames before
    /// returning from `send_notification`.
    block_buf: Vec<u8>,
    frame_buf: Vec<u8>,
    pacing: PacingState,
    stats: SenderStats,
    last_congestion_report: Option<Instant>,
}

impl<S: BlockSource, L: NotificationSink> SenderSession<S, L> {
    pub fn new(source: S, link: L, mode: TransferMode) -> Self {
        Self {
            source,
            link,
            mode,
            state: SenderState::Idle,
            notifications_enabled: false,
            mtu: DEFAULT_MTU,
            chunk_payload: chunk_payload_for(DEFAULT_MTU),
            cur_block: 0,
            cur_chunk: 0,
            last_acked_block: 0,
            block_buf: Vec::new(),
            frame_buf: Vec::new(),
            pacing: PacingState::new(),
            stats: SenderStats::default(),
            last_congestion_report: None,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Update the negotiated MTU; effective from the next chunk built.
    pub fn set_mtu(&mut self, mtu: u16) {
        self.mtu = mtu;
        self.chunk_payload = chunk_payload_for(mtu);
        tracing::debug!(mtu, chunk_payload = self.chunk_payload, "mtu updated");
    }

    /// Begin a transfer from block zero.
    pub fn start(&mut self, mode: TransferMode) -> Result<(), SessionError> {
        if !self.notifications_enabled {
            return Err(SessionError::NotificationsDisabled);
        }
        if self.state != SenderState::Idle {
            return Err(SessionError::InvalidState {
                expected: "Idle",
                actual: self.state.name(),
            });
        }

        self.mode = mode;
        self.cur_block = 0;
        self.cur_chunk = 0;
        self.last_acked_block = 0;
        self.pacing.reset();
        self.last_congestion_report = None;
        self.stats = SenderStats {
            started_at: Some(Instant::now()),
            ..SenderStats::default()
        };
        self.source.fill_block(0, self.mode, &mut self.block_buf);
        self.state = SenderState::Active;

        tracing::info!(
            total_blocks = TOTAL_BLOCKS,
            block_size = self.block_buf.len(),
            mode = ?self.mode,
            chunk_payload = self.chunk_payload,
            "transfer started"
        );
        Ok(())
    }

    /// Stop the transfer and return to idle.
    pub fn stop(&mut self) {
        if self.state != SenderState::Idle {
            tracing::info!(blocks_sent = self.stats.blocks_sent, "transfer stopped");
        }
        if self.stats.started_at.is_some() && self.stats.finished_at.is_none() {
            self.stats.finished_at = Some(Instant::now());
        }
        self.state = SenderState::Idle;
    }

    // -----------------------------------------------------------------------
    // Driver tick
    // -----------------------------------------------------------------------

    /// Drive one tick of the send loop.
    ///
    /// The driver sleeps [`Self::recommended_delay`] between ticks
    /// regardless of the outcome.
    pub fn process_next_chunk(&mut self) -> Tick {
        match self.state {
            SenderState::Idle | SenderState::Paused => Tick::Idle,
            SenderState::Complete => Tick::Complete,
            SenderState::WaitingAck => Tick::AwaitingAck,
            SenderState::Active => self.send_current_chunk(),
        }
    }

    fn send_current_chunk(&mut self) -> Tick {
        if !self.pacing.has_credit() {
            self.report_congestion("credits exhausted");
            return Tick::Blocked;
        }

        let block_size = self.block_buf.len();
        let total_chunks = block_size.div_ceil(self.chunk_payload);
        let mut offset = usize::from(self.cur_chunk) * self.chunk_payload;
        if offset >= block_size {
            // The MTU changed mid-block; restart the block under the new
            // chunk geometry and let the receiver drop the mixed partial.
            self.cur_chunk = 0;
            offset = 0;
        }
        let chunk_size = self.chunk_payload.min(block_size - offset);

        let header = ChunkHeader {
            block_number: self.cur_block,
            chunk_number: self.cur_chunk,
            chunk_size: chunk_size as u16,
            total_chunks: total_chunks as u16,
        };
        self.frame_buf.clear();
        self.frame_buf.extend_from_slice(&header.encode());
        self.frame_buf
            .extend_from_slice(&self.block_buf[offset..offset + chunk_size]);

        match self.link.send_notification(&self.frame_buf) {
            SendOutcome::Sent => {
                self.pacing.on_success();
                self.stats.total_chunks += 1;
                self.stats.total_bytes += chunk_size as u64;
                self.advance(total_chunks as u16);
                Tick::Sent
            }
            SendOutcome::Congested => {
                self.stats.send_failures += 1;
                if self.pacing.on_congested() {
                    self.stats.congestion_events += 1;
                    self.report_congestion("link congested");
                }
                Tick::Blocked
            }
            SendOutcome::Failed => {
                // Non-congestion failures leave pacing alone; the chunk is
                // retried next tick and the ACK barrier bounds any loss.
                self.stats.send_failures += 1;
                tracing::warn!(
                    block = self.cur_block,
                    chunk = self.cur_chunk,
                    "notification send failed"
                );
                Tick::Blocked
            }
        }
    }

    fn advance(&mut self, total_chunks: u16) {
        self.cur_chunk += 1;
        if self.cur_chunk < total_chunks {
            return;
        }

        self.cur_chunk = 0;
        self.cur_block += 1;
        self.stats.blocks_sent += 1;

        if self.cur_block == TOTAL_BLOCKS {
            self.state = SenderState::Complete;
            self.stats.finished_at = Some(Instant::now());
            tracing::info!(
                blocks = self.stats.blocks_sent,
                bytes = self.stats.total_bytes,
                throughput_kbps = self.stats.throughput_kbps(),
                congestion_events = self.stats.congestion_events,
                disconnections = self.stats.disconnections,
                "transfer complete"
            );
            return;
        }

        if self.cur_block.is_multiple_of(ACK_INTERVAL) {
            self.state = SenderState::WaitingAck;
            tracing::debug!(
                through = self.cur_block - 1,
                "ack barrier: waiting for cumulative ack"
            );
        }

        self.source
            .fill_block(self.cur_block, self.mode, &mut self.block_buf);
    }

    // -----------------------------------------------------------------------
    // Link and control events
    // -----------------------------------------------------------------------

    /// Handle a write to the control characteristic.
    pub fn on_control_write(&mut self, data: &[u8]) {
        let msg = match ControlMessage::decode(data) {
            Ok(msg) => msg,
            Err(err) => {
                tracing::warn!(%err, len = data.len(), "bad control write");
                return;
            }
        };
        match msg.command {
            ControlCommand::Start => {
                if let Err(err) = self.start(self.mode) {
                    tracing::warn!(%err, "start rejected");
                }
            }
            ControlCommand::Stop => self.stop(),
            ControlCommand::Ack => self.on_ack(msg.block_number),
        }
    }

    fn on_ack(&mut self, block: u16) {
        if block >= TOTAL_BLOCKS {
            tracing::warn!(block, "ack block out of range, ignored");
            return;
        }
        if block < self.last_acked_block {
            tracing::debug!(
                block,
                last_acked = self.last_acked_block,
                "stale ack ignored"
            );
            return;
        }
        self.last_acked_block = block + 1;
        // Only an ACK covering the barrier block releases the barrier; a
        // fresh-but-earlier ACK still advances the cumulative mark.
        if self.state == SenderState::WaitingAck && block + 1 >= self.cur_block {
            self.state = SenderState::Active;
            tracing::debug!(acked_through = block, next = self.cur_block, "ack received, resuming");
        }
    }

    /// CCCD write on the data characteristic. Unsubscribing mid-transfer
    /// pauses the session.
    pub fn on_cccd_write(&mut self, enabled: bool) {
        self.notifications_enabled = enabled;
        tracing::debug!(enabled, "data notifications toggled");
        if !enabled {
            self.pause();
        }
    }

    /// Link dropped: keep progress, pause the session.
    pub fn on_disconnect(&mut self) {
        self.pause();
    }

    fn pause(&mut self) {
        if matches!(self.state, SenderState::Active | SenderState::WaitingAck) {
            self.state = SenderState::Paused;
            self.stats.disconnections += 1;
            tracing::info!(
                block = self.cur_block,
                chunk = self.cur_chunk,
                last_acked = self.last_acked_block,
                "transfer paused"
            );
        }
    }

    /// Link re-established: rewind to the last cumulative ACK and resume.
    ///
    /// Blocks in the un-acknowledged window are retransmitted; the
    /// receiver discards blocks it already holds.
    pub fn on_reconnect(&mut self, mtu: u16) -> Result<(), SessionError> {
        if self.state != SenderState::Paused {
            return Err(SessionError::InvalidState {
                expected: "Paused",
                actual: self.state.name(),
            });
        }
        if !self.notifications_enabled {
            return Err(SessionError::NotificationsDisabled);
        }

        self.set_mtu(mtu);
        self.stats.retransmits +=
            u32::from(self.cur_block.saturating_sub(self.last_acked_block));
        self.cur_block = self.last_acked_block;
        self.cur_chunk = 0;
        self.source
            .fill_block(self.cur_block, self.mode, &mut self.block_buf);
        self.state = SenderState::Active;

        tracing::info!(
            resume_block = self.cur_block,
            remaining = TOTAL_BLOCKS - self.cur_block,
            "transfer resumed"
        );
        Ok(())
    }

    /// A previously queued notification left the link stack.
    pub fn on_notification_transmitted(&mut self) {
        self.pacing.on_transmit_complete();
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Delay the driver should sleep between ticks, in milliseconds.
    pub fn recommended_delay(&self) -> u16 {
        self.pacing.recommended_delay()
    }

    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    pub fn current_block(&self) -> u16 {
        self.cur_block
    }

    pub fn current_chunk(&self) -> u16 {
        self.cur_chunk
    }

    pub fn last_acked_block(&self) -> u16 {
        self.last_acked_block
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    fn report_congestion(&mut self, reason: &'static str) {
        let now = Instant::now();
        let due = self
            .last_congestion_report
            .is_none_or(|last| now - last > CONGESTION_REPORT_INTERVAL);
        if due {
            self.last_congestion_report = Some(now);
            tracing::warn!(
                reason,
                block = self.cur_block,
                chunk = self.cur_chunk,
                delay_ms = self.pacing.recommended_delay(),
                credits = self.pacing.credits(),
                "send throttled"
            );
        }
    }
}

fn chunk_payload_for(mtu: u16) -> usize {
    usize::from(mtu)
        .saturating_sub(ATT_NOTIFY_OVERHEAD + CHUNK_HEADER_SIZE)
        .max(1)
}
