//! Amplitude envelope construction
//!
//! An envelope is a fixed-rate (50 slices per second) sequence of
//! normalized amplitude magnitudes used to draw a waveform overview.
//!
//! **Algorithm:**
//! 1. `slice_count = floor(duration * 50)`
//! 2. `block_size = floor(sample_count / slice_count)`
//! 3. Each slice = mean of `|sample|` over its block (empty blocks skipped)
//! 4. Divide by the global maximum (left at zero for silent input)

use rand::Rng;
use std::sync::Arc;

pub mod builder;
pub mod decoder;

pub use builder::EnvelopeBuilder;
pub use decoder::{AudioDecoder, DecodedAudio, SymphoniaDecoder};

use crate::asset::AssetKey;

/// Envelope slices per second of audio
pub const ENVELOPE_RATE_HZ: u32 = 50;

/// Immutable, normalized amplitude envelope
///
/// Values are in `[0.0, 1.0]`; cloning shares the underlying slice.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformEnvelope {
    values: Arc<[f32]>,
}

impl Default for WaveformEnvelope {
    fn default() -> Self {
        Self {
            values: Arc::from(Vec::new()),
        }
    }
}

impl WaveformEnvelope {
    /// Build an envelope from mono samples covering `duration_seconds`
    pub fn from_samples(samples: &[f32], duration_seconds: f64) -> Self {
        let slice_count = slice_count_for(duration_seconds);
        if slice_count == 0 || samples.is_empty() {
            return Self::default();
        }

        let block_size = samples.len() / slice_count;
        let mut values = Vec::with_capacity(slice_count);

        for slice in 0..slice_count {
            let start = slice * block_size;
            let end = (start + block_size).min(samples.len());
            if end <= start {
                // Nothing counted for this block: skip rather than insert 0/NaN
                continue;
            }

            let block = &samples[start..end];
            let sum: f64 = block
                .iter()
                .map(|s| if s.is_finite() { s.abs() as f64 } else { 0.0 })
                .sum();
            values.push((sum / block.len() as f64) as f32);
        }

        normalize(&mut values);
        Self {
            values: Arc::from(values),
        }
    }

    /// Synthetic placeholder used when decoding fails
    ///
    /// `floor(duration * 50)` pseudo-random values in `[0.25, 0.75]`.
    /// Content is opaque beyond shape and range.
    pub fn fallback<R: Rng + ?Sized>(duration_seconds: f64, rng: &mut R) -> Self {
        let values: Vec<f32> = (0..slice_count_for(duration_seconds))
            .map(|_| rng.gen_range(0.25f32..=0.75f32))
            .collect();
        Self {
            values: Arc::from(values),
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn slice_count_for(duration_seconds: f64) -> usize {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return 0;
    }
    (duration_seconds * ENVELOPE_RATE_HZ as f64).floor() as usize
}

fn normalize(values: &mut [f32]) {
    let max = values.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        for v in values.iter_mut() {
            *v = (*v / max).clamp(0.0, 1.0);
        }
    }
}

/// Outcome of a build, reported alongside the envelope
#[derive(Debug, Clone, PartialEq)]
pub enum BuildStatus {
    /// Envelope reflects the decoded audio
    Decoded,
    /// Decoding failed or timed out; envelope is a synthetic placeholder
    Degraded { reason: String },
}

impl BuildStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, BuildStatus::Degraded { .. })
    }
}

/// A finished envelope build for one asset
#[derive(Debug, Clone)]
pub struct EnvelopeBuild {
    pub asset: AssetKey,
    pub envelope: WaveformEnvelope,
    /// Authoritative duration (decoded), or the provisional/fallback one when degraded
    pub duration_seconds: f64,
    pub status: BuildStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_slice_count_follows_rate() {
        // 2s at 1000 Hz -> 100 slices of 20 samples
        let samples: Vec<f32> = (0..2000).map(|i| if i < 1000 { 0.5 } else { -1.0 }).collect();
        let env = WaveformEnvelope::from_samples(&samples, 2.0);
        assert_eq!(env.len(), 100);
        assert!((env.values()[0] - 0.5).abs() < 1e-6);
        assert!((env.values()[99] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_values_within_unit_range() {
        let samples: Vec<f32> = (0..44_100)
            .map(|i| ((i as f32) * 0.01).sin() * 0.3)
            .collect();
        let env = WaveformEnvelope::from_samples(&samples, 1.0);
        assert_eq!(env.len(), 50);
        assert!(env.values().iter().all(|v| (0.0..=1.0).contains(v)));
        let max = env.values().iter().copied().fold(0.0f32, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_silence_stays_zero() {
        let samples = vec![0.0f32; 8_000];
        let env = WaveformEnvelope::from_samples(&samples, 1.0);
        assert_eq!(env.len(), 50);
        assert!(env.values().iter().all(|v| *v == 0.0));
        assert!(env.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_zero_duration_is_empty() {
        let env = WaveformEnvelope::from_samples(&[0.5, 0.5], 0.0);
        assert!(env.is_empty());
        assert!(WaveformEnvelope::from_samples(&[], 3.0).is_empty());
    }

    #[test]
    fn test_non_finite_samples_do_not_poison_envelope() {
        let mut samples = vec![0.25f32; 1000];
        samples[3] = f32::NAN;
        samples[500] = f32::INFINITY;
        let env = WaveformEnvelope::from_samples(&samples, 1.0);
        assert!(env.values().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_fewer_samples_than_slices_skips_empty_blocks() {
        // 10 samples claimed to span 1s: block size 0 -> every block skipped
        let env = WaveformEnvelope::from_samples(&[1.0; 10], 1.0);
        assert!(env.is_empty());
    }

    #[test]
    fn test_fallback_shape_and_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let env = WaveformEnvelope::fallback(12.345, &mut rng);
        assert_eq!(env.len(), 617);
        assert!(env.values().iter().all(|v| (0.25..=0.75).contains(v)));
        assert!(WaveformEnvelope::fallback(0.0, &mut rng).is_empty());
    }
}
