//! Audio-related type definitions (spec §3, §6).
//!
//! The pipeline operates on 16 kHz mono `f32` PCM throughout; decoding a
//! source file into that format is an external concern (§6's audio
//! decoder contract), not re-implemented here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed sample rate the rest of the pipeline assumes (spec §3's AudioFrame stream).
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// A finite sequence of 16 kHz mono `f32` PCM samples, by convention in `[-1, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioTrack {
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Splits the track into fixed-length, zero-padded chunks advancing by `hop_seconds`.
    pub fn into_chunks(&self, chunk_duration_seconds: f32, hop_seconds: f32) -> Vec<AudioChunk> {
        let chunk_len = (chunk_duration_seconds * self.sample_rate as f32).round() as usize;
        let hop_len = (hop_seconds * self.sample_rate as f32).round() as usize;
        let hop_len = hop_len.max(1);

        if chunk_len == 0 || self.samples.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut index = 0usize;
        loop {
            if start >= self.samples.len() {
                break;
            }
            let end = (start + chunk_len).min(self.samples.len());
            let mut samples = self.samples[start..end].to_vec();
            samples.resize(chunk_len, 0.0);

            chunks.push(AudioChunk {
                index,
                start_seconds: start as f32 / self.sample_rate as f32,
                samples,
                sample_rate: self.sample_rate,
            });

            if end >= self.samples.len() {
                break;
            }
            start += hop_len;
            index += 1;
        }

        chunks
    }
}

/// One fixed-duration window of audio handed to the chunked streaming pipeline (§3, §4.5).
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Zero-based position of this chunk within the recording.
    pub index: usize,
    /// Wall-clock offset, in seconds, of this chunk's first sample within the recording.
    pub start_seconds: f32,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Decodes an external audio source into a 16 kHz mono `f32` track (§6).
///
/// Real file decoding, container demuxing, and codec support are external
/// concerns; implementors are expected to down-mix multi-channel audio to
/// mono by arithmetic average and resample with the ratio `source / target`.
pub trait AudioDecoder {
    fn decode(&self) -> Result<AudioTrack, AudioError>;
}

/// Down-mixes interleaved multi-channel `f32` samples to mono by arithmetic average.
pub fn downmix_to_mono(interleaved: &[f32], channels: u8) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return interleaved.to_vec();
    }
    let frames = interleaved.len() / channels;
    let mut mono = Vec::with_capacity(frames);
    for frame in 0..frames {
        let mut sum = 0.0f32;
        for ch in 0..channels {
            sum += interleaved[frame * channels + ch];
        }
        mono.push(sum / channels as f32);
    }
    mono
}

/// Audio processing errors (§7).
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("audio source not found: {path}")]
    SourceNotFound { path: String },

    #[error("audio decoding failed: {message}")]
    DecodeFailed { message: String },

    #[error("empty audio track")]
    EmptyTrack,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_cover_whole_track_with_zero_padding() {
        let track = AudioTrack {
            samples: vec![1.0; 25_000],
            sample_rate: SAMPLE_RATE_HZ,
        };
        let chunks = track.into_chunks(1.0, 1.0);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].samples.len(), SAMPLE_RATE_HZ as usize);
        assert_eq!(chunks[1].samples.len(), SAMPLE_RATE_HZ as usize);
        assert!(chunks[1].samples[9_001..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn overlap_produces_smaller_hop_than_chunk_duration() {
        let track = AudioTrack {
            samples: vec![0.5; 40_000],
            sample_rate: SAMPLE_RATE_HZ,
        };
        let chunks = track.into_chunks(2.0, 1.0);
        assert!(chunks.len() > 1);
        assert_eq!(chunks[1].start_seconds, 1.0);
    }

    #[test]
    fn downmix_averages_channels() {
        let stereo = vec![1.0, -1.0, 0.5, 0.5];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono, vec![0.0, 0.5]);
    }
}
