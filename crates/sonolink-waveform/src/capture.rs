//! Simulated pulse-echo capture.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sonolink_core::Waveform;
use sonolink_core::constants::SAMPLES_PER_BLOCK;
use sonolink_core::sample::crc32_samples;
use sonolink_core::wire::WaveformHeader;

/// Signed 24-bit sample limits.
const SAMPLE_MAX: i64 = 8_388_607;
const SAMPLE_MIN: i64 = -8_388_608;

/// Samples an echo wavelet contributes past its arrival.
const ECHO_WINDOW: usize = 300;

/// Simulated interval between captures.
const CAPTURE_PERIOD_MS: u32 = 100;

/// One echo arrival: center sample, peak amplitude, envelope decay per
/// sample.
#[derive(Debug, Clone, Copy)]
pub struct Echo {
    pub center: usize,
    pub amplitude: i32,
    pub decay: f32,
}

/// Parameters of the simulated transducer and measurement geometry.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub sample_rate_hz: u32,
    pub pulse_freq_hz: u32,
    pub trigger_sample: u16,
    /// Peak noise-floor amplitude in counts.
    pub noise_amplitude: i32,
    pub echoes: Vec<Echo>,
    pub temperature_cx10: i16,
    pub gain_db: u8,
    /// Base RNG seed; combined with the block number so regeneration of a
    /// block after a resume is bit-identical.
    pub seed: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 50_000_000,
            pulse_freq_hz: 5_000_000,
            trigger_sample: 250,
            noise_amplitude: 100,
            echoes: vec![
                Echo { center: 375, amplitude: 2_500_000, decay: 0.03 },
                Echo { center: 875, amplitude: 5_000_000, decay: 0.03 },
                Echo { center: 1250, amplitude: 1_600_000, decay: 0.045 },
            ],
            temperature_cx10: 235,
            gain_db: 60,
            seed: 12345,
        }
    }
}

impl CaptureConfig {
    /// A low-amplitude profile whose sample deltas always fit the 16-bit
    /// delta stream, suitable for compressed sessions.
    pub fn low_gain() -> Self {
        Self {
            noise_amplitude: 40,
            echoes: vec![
                Echo { center: 375, amplitude: 6_000, decay: 0.03 },
                Echo { center: 875, amplitude: 9_000, decay: 0.03 },
                Echo { center: 1250, amplitude: 4_000, decay: 0.045 },
            ],
            gain_db: 20,
            ..Self::default()
        }
    }

    /// Capture the waveform for `block`, header populated and CRC set over
    /// the packed-sample form.
    pub fn capture(&self, block: u16) -> Waveform {
        let mut rng = StdRng::seed_from_u64(self.seed ^ (u64::from(block) << 20));

        let mut samples = Vec::with_capacity(SAMPLES_PER_BLOCK);
        for i in 0..SAMPLES_PER_BLOCK {
            let mut sample = if self.noise_amplitude > 0 {
                i64::from(rng.gen_range(-self.noise_amplitude..=self.noise_amplitude))
            } else {
                0
            };
            for echo in &self.echoes {
                if i >= echo.center && i < echo.center + ECHO_WINDOW {
                    sample += i64::from(self.echo_at(echo, i));
                }
            }
            samples.push(sample.clamp(SAMPLE_MIN, SAMPLE_MAX) as i32);
        }

        let mut header = WaveformHeader {
            block_number: u32::from(block),
            timestamp_ms: u32::from(block) * CAPTURE_PERIOD_MS,
            sample_rate_hz: self.sample_rate_hz,
            sample_count: SAMPLES_PER_BLOCK as u16,
            trigger_sample: self.trigger_sample,
            pulse_freq_hz: self.pulse_freq_hz,
            temperature_cx10: self.temperature_cx10,
            gain_db: self.gain_db,
            crc32: 0,
        };
        header.crc32 = crc32_samples(&samples);

        Waveform { header, samples }
    }

    /// Carrier wavelet under an exponential decay envelope.
    fn echo_at(&self, echo: &Echo, i: usize) -> i32 {
        let dt = i as f32 - echo.center as f32;
        let envelope = (-echo.decay * dt.abs()).exp();
        let phase = core::f32::consts::TAU * self.pulse_freq_hz as f32 * i as f32
            / self.sample_rate_hz as f32;
        (echo.amplitude as f32 * envelope * phase.sin()) as i32
    }
}
