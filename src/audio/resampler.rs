//! Linear-interpolation sample rate conversion (spec §6's audio decoder contract).
//!
//! The contract only requires resampling "acceptable for benchmarking", not
//! high-fidelity reconstruction, so this keeps the teacher's linear
//! interpolation core and drops the window-quality modes and multi-channel
//! interleaving machinery that the original resampler offered — channel
//! down-mixing happens upstream in [`crate::audio::types::downmix_to_mono`].

use crate::audio::types::{AudioError, AudioTrack};
use tracing::debug;

/// Resamples mono `f32` audio to a target sample rate using linear interpolation.
pub struct LinearResampler {
    source_sample_rate: u32,
    target_sample_rate: u32,
    conversion_ratio: f64,
}

impl LinearResampler {
    pub fn new(source_sample_rate: u32, target_sample_rate: u32) -> Result<Self, AudioError> {
        if source_sample_rate == 0 || target_sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(0));
        }

        Ok(Self {
            source_sample_rate,
            target_sample_rate,
            conversion_ratio: target_sample_rate as f64 / source_sample_rate as f64,
        })
    }

    pub fn needs_resampling(&self) -> bool {
        self.source_sample_rate != self.target_sample_rate
    }

    pub fn process(&self, track: &AudioTrack) -> Result<AudioTrack, AudioError> {
        if track.sample_rate != self.source_sample_rate {
            return Err(AudioError::DecodeFailed {
                message: format!(
                    "sample rate mismatch: expected {}, got {}",
                    self.source_sample_rate, track.sample_rate
                ),
            });
        }

        if !self.needs_resampling() {
            return Ok(track.clone());
        }

        let resampled = self.resample_mono(&track.samples);
        debug!(
            from = track.samples.len(),
            to = resampled.len(),
            ratio = self.conversion_ratio,
            "resampled audio track"
        );

        Ok(AudioTrack {
            samples: resampled,
            sample_rate: self.target_sample_rate,
        })
    }

    fn resample_mono(&self, samples: &[f32]) -> Vec<f32> {
        if samples.is_empty() {
            return Vec::new();
        }

        let input_len = samples.len();
        let output_len = (input_len as f64 * self.conversion_ratio) as usize;
        let mut output = Vec::with_capacity(output_len);

        for i in 0..output_len {
            let input_index = i as f64 / self.conversion_ratio;
            let floor_index = input_index.floor() as usize;
            let ceil_index = (floor_index + 1).min(input_len - 1);

            if floor_index == ceil_index {
                output.push(samples[floor_index]);
            } else {
                let fraction = (input_index - floor_index as f64) as f32;
                let low = samples[floor_index];
                let high = samples[ceil_index];
                output.push(low + (high - low) * fraction);
            }
        }

        output
    }
}
