//! Simulated ultrasound waveform capture for the sonolink transfer stack.
//!
//! Real deployments capture pulse-echo waveforms from a transducer front
//! end. This crate synthesizes blocks with the same shape, a noise floor
//! carrying decaying carrier-frequency echoes, so the sending session can
//! be exercised end to end without hardware.

pub mod capture;
pub mod source;

pub use capture::{CaptureConfig, Echo};
pub use source::WaveformBlockSource;
