//! Decoded waveform value passed across the receive boundary.

use crate::wire::WaveformHeader;

/// One decoded waveform block: header plus sign-extended 24-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Waveform {
    pub header: WaveformHeader,
    pub samples: Vec<i32>,
}
