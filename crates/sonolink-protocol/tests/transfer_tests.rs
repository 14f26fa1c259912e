//! End-to-end loopback tests: a sender session chunking simulated
//! waveform blocks into a recording link, fed straight into a receiver
//! session with the ACK channel wired back.

use sonolink_core::constants::{TOTAL_BLOCKS, TransferMode};
use sonolink_core::wire::ControlMessage;
use sonolink_core::Waveform;
use sonolink_protocol::{
    NotificationSink, ReceiverEvents, ReceiverSession, SendOutcome, SenderSession, SenderState,
    Tick, TransferStats,
};
use sonolink_waveform::{CaptureConfig, WaveformBlockSource};

/// Link that accepts everything and records the frames.
#[derive(Default)]
struct RecordingLink {
    sent: Vec<Vec<u8>>,
}

impl NotificationSink for RecordingLink {
    fn send_notification(&mut self, frame: &[u8]) -> SendOutcome {
        self.sent.push(frame.to_vec());
        SendOutcome::Sent
    }
}

#[derive(Default)]
struct Collector {
    waveforms: Vec<(u32, bool)>,
    acks: Vec<u16>,
    /// How many entries of `acks` the test harness already relayed.
    forwarded: usize,
    progress: usize,
    completions: Vec<TransferStats>,
}

impl ReceiverEvents for Collector {
    fn on_waveform(&mut self, waveform: &Waveform, compressed: bool) {
        self.waveforms.push((waveform.header.block_number, compressed));
    }
    fn on_progress(&mut self, _stats: &TransferStats) {
        self.progress += 1;
    }
    fn on_complete(&mut self, stats: &TransferStats) {
        self.completions.push(*stats);
    }
    fn on_ack_due(&mut self, block: u16) {
        self.acks.push(block);
    }
}

type Sender = SenderSession<WaveformBlockSource, RecordingLink>;
type Receiver = ReceiverSession<Collector>;

fn make_pair(config: CaptureConfig, mode: TransferMode, mtu: u16) -> (Sender, Receiver) {
    let mut sender = SenderSession::new(
        WaveformBlockSource::new(config),
        RecordingLink::default(),
        mode,
    );
    sender.set_mtu(mtu);
    sender.on_cccd_write(true);
    sender.start(mode).unwrap();

    let mut receiver = ReceiverSession::new(Collector::default());
    receiver.start();
    (sender, receiver)
}

/// Pump the pair until the sender completes, relaying every frame and
/// forwarding ACKs back over the control channel.
fn pump_to_completion(sender: &mut Sender, receiver: &mut Receiver) {
    for _ in 0..200_000_000u64 {
        match sender.process_next_chunk() {
            Tick::Sent => {
                sender.on_notification_transmitted();
                let frame = sender.link_mut().sent.pop().unwrap();
                receiver.process_chunk(&frame);
                let acks: Vec<u16> = {
                    let collector = receiver.events_mut();
                    let pending = collector.acks[collector.forwarded..].to_vec();
                    collector.forwarded = collector.acks.len();
                    pending
                };
                for ack in acks {
                    sender.on_control_write(&ControlMessage::ack(ack, 0).encode());
                }
            }
            Tick::Complete => return,
            other => panic!("transfer stalled on {other:?}"),
        }
    }
    panic!("pump guard tripped");
}

#[test]
fn raw_transfer_delivers_every_block() {
    let (mut sender, mut receiver) = make_pair(CaptureConfig::default(), TransferMode::Raw, 247);
    pump_to_completion(&mut sender, &mut receiver);

    assert_eq!(sender.state(), SenderState::Complete);
    assert_eq!(sender.stats().blocks_sent, TOTAL_BLOCKS);

    let collector = receiver.events();
    assert_eq!(collector.waveforms.len(), usize::from(TOTAL_BLOCKS));
    assert_eq!(collector.completions.len(), 1);
    assert_eq!(collector.progress, usize::from(TOTAL_BLOCKS));
    assert!(collector.waveforms.iter().all(|&(_, compressed)| !compressed));

    // Every block arrived exactly once, in order.
    let blocks: Vec<u32> = collector.waveforms.iter().map(|&(b, _)| b).collect();
    let expected: Vec<u32> = (0..u32::from(TOTAL_BLOCKS)).collect();
    assert_eq!(blocks, expected);

    // One cumulative ACK per interval.
    assert_eq!(collector.acks.len(), usize::from(TOTAL_BLOCKS / 20));
    assert_eq!(collector.acks.first(), Some(&19));
    assert_eq!(collector.acks.last(), Some(&1799));

    let final_stats = &collector.completions[0];
    assert_eq!(final_stats.blocks_received, u32::from(TOTAL_BLOCKS));
    assert_eq!(final_stats.decode_errors, 0);
    assert_eq!(final_stats.frame_errors, 0);
    assert!(!receiver.is_active());
}

#[test]
fn compressed_transfer_round_trips_low_gain_capture() {
    let (mut sender, mut receiver) =
        make_pair(CaptureConfig::low_gain(), TransferMode::Compressed, 247);
    pump_to_completion(&mut sender, &mut receiver);

    let collector = receiver.events();
    assert_eq!(collector.waveforms.len(), usize::from(TOTAL_BLOCKS));
    assert_eq!(collector.completions.len(), 1);
    // Low-gain capture always fits the delta stream: nothing fell back.
    assert!(collector.waveforms.iter().all(|&(_, compressed)| compressed));
    assert_eq!(collector.completions[0].decode_errors, 0);

    // Compression actually saved wire bytes.
    assert!(
        collector.completions[0].total_bytes_received
            < u64::from(TOTAL_BLOCKS) * 7168 / 2
    );
}

#[test]
fn compressed_transfer_falls_back_to_raw_at_full_gain() {
    let (mut sender, mut receiver) =
        make_pair(CaptureConfig::default(), TransferMode::Compressed, 247);
    pump_to_completion(&mut sender, &mut receiver);

    let collector = receiver.events();
    assert_eq!(collector.waveforms.len(), usize::from(TOTAL_BLOCKS));
    // Full-gain echoes exceed the 16-bit delta range; every block was
    // classified raw on arrival.
    assert!(collector.waveforms.iter().all(|&(_, compressed)| !compressed));
    assert_eq!(collector.completions.len(), 1);
}

#[test]
fn small_mtu_transfer_still_completes() {
    // 64-byte MTU: 49-byte chunk payload, 147 chunks per raw block.
    let (mut sender, mut receiver) = make_pair(CaptureConfig::default(), TransferMode::Raw, 64);
    pump_to_completion(&mut sender, &mut receiver);

    let collector = receiver.events();
    assert_eq!(collector.waveforms.len(), usize::from(TOTAL_BLOCKS));
    assert_eq!(collector.completions.len(), 1);
}

#[test]
fn received_samples_match_captured_samples() {
    struct SampleCheck {
        config: CaptureConfig,
        checked: usize,
        acks: Vec<u16>,
        forwarded: usize,
    }
    impl ReceiverEvents for SampleCheck {
        fn on_waveform(&mut self, waveform: &Waveform, _compressed: bool) {
            // Spot-check a stride of blocks; comparing all 1800 would
            // dominate the test run.
            if waveform.header.block_number % 97 == 0 {
                let expected = self.config.capture(waveform.header.block_number as u16);
                assert_eq!(waveform.samples, expected.samples);
                assert_eq!(waveform.header, expected.header);
                self.checked += 1;
            }
        }
        fn on_ack_due(&mut self, block: u16) {
            self.acks.push(block);
        }
    }

    let config = CaptureConfig::default();
    let mut sender = SenderSession::new(
        WaveformBlockSource::new(config.clone()),
        RecordingLink::default(),
        TransferMode::Raw,
    );
    sender.set_mtu(247);
    sender.on_cccd_write(true);
    sender.start(TransferMode::Raw).unwrap();

    let mut receiver = ReceiverSession::new(SampleCheck {
        config,
        checked: 0,
        acks: Vec::new(),
        forwarded: 0,
    });
    receiver.start();

    for _ in 0..200_000_000u64 {
        match sender.process_next_chunk() {
            Tick::Sent => {
                sender.on_notification_transmitted();
                let frame = sender.link_mut().sent.pop().unwrap();
                receiver.process_chunk(&frame);
                let pending: Vec<u16> = {
                    let events = receiver.events_mut();
                    let acks = events.acks[events.forwarded..].to_vec();
                    events.forwarded = events.acks.len();
                    acks
                };
                for ack in pending {
                    sender.on_control_write(&ControlMessage::ack(ack, 0).encode());
                }
            }
            Tick::Complete => break,
            other => panic!("transfer stalled on {other:?}"),
        }
    }

    assert!(receiver.events().checked >= 18);
}

#[test]
fn barrier_holds_until_ack_arrives() {
    let mut sender = SenderSession::new(
        WaveformBlockSource::default(),
        RecordingLink::default(),
        TransferMode::Raw,
    );
    sender.set_mtu(247);
    sender.on_cccd_write(true);
    sender.start(TransferMode::Raw).unwrap();

    let mut receiver = ReceiverSession::new(Collector::default());
    receiver.start();

    // Relay without forwarding ACKs: the sender must stop at the barrier.
    loop {
        match sender.process_next_chunk() {
            Tick::Sent => {
                sender.on_notification_transmitted();
                let frame = sender.link_mut().sent.pop().unwrap();
                receiver.process_chunk(&frame);
            }
            Tick::AwaitingAck => break,
            other => panic!("unexpected tick {other:?}"),
        }
    }

    assert_eq!(sender.current_block(), 20);
    assert_eq!(receiver.completed_blocks(), 20);
    assert_eq!(receiver.events().acks, [19]);

    // No further frames while waiting.
    for _ in 0..10 {
        assert_eq!(sender.process_next_chunk(), Tick::AwaitingAck);
    }
    assert!(sender.link().sent.is_empty());

    // Release the barrier with the receiver's pending ACK.
    let ack = receiver.events().acks[0];
    sender.on_control_write(&ControlMessage::ack(ack, 0).encode());
    assert_eq!(sender.process_next_chunk(), Tick::Sent);
}
