//! Block source backed by the simulated capture.

use sonolink_core::block::{BlockSource, encode_block};
use sonolink_core::constants::TransferMode;
use sonolink_core::error::BlockError;

use crate::capture::CaptureConfig;

/// [`BlockSource`] that captures (or regenerates) each block on demand.
///
/// In compressed mode, a block whose sample deltas do not fit the 16-bit
/// delta stream (or whose deflated form would not land below the block
/// bound) is sent raw instead. The receiver classifies the encoding per
/// block, so mixed encodings are legal on the wire.
#[derive(Debug, Clone, Default)]
pub struct WaveformBlockSource {
    config: CaptureConfig,
}

impl WaveformBlockSource {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

impl BlockSource for WaveformBlockSource {
    fn fill_block(&mut self, block: u16, mode: TransferMode, out: &mut Vec<u8>) {
        let waveform = self.config.capture(block);

        if mode == TransferMode::Compressed {
            match encode_block(&waveform.header, &waveform.samples, mode, out) {
                Ok(()) => return,
                Err(BlockError::DeltaRange(_) | BlockError::CompressedTooLarge(_)) => {
                    tracing::debug!(block, "block not delta-representable, sending raw");
                }
                Err(err) => {
                    tracing::warn!(block, %err, "compressed encode failed, sending raw");
                }
            }
        }

        encode_block(&waveform.header, &waveform.samples, TransferMode::Raw, out)
            .expect("raw block encoding never fails");
    }
}
