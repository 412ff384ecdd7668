//! Segmentation decoder: tensor → per-speaker activity regions (spec §4.3).
//!
//! Replaces the teacher's `SpeakerEmbedder::process_segmentation_window`
//! energy-based fallback (the real ONNX segmentation inference it stubbed
//! out is an external collaborator here, see [`crate::diarization::external`])
//! with the spec's deterministic smoothing algorithm over an external
//! model's raw activity tensor.

use crate::config::DiarizationConfig;
use crate::diarization::types::{LocalRegion, SegmentationFrame};
use crate::error::SegmentationError;

/// Decodes a [`SegmentationFrame`] into smoothed [`LocalRegion`]s for one chunk.
pub struct SegmentationDecoder {
    activity_threshold: f32,
    min_duration_on: f32,
    min_duration_off: f32,
}

impl SegmentationDecoder {
    pub fn new(config: &DiarizationConfig) -> Self {
        Self {
            activity_threshold: config.min_activity_threshold,
            min_duration_on: config.min_duration_on,
            min_duration_off: config.min_duration_off,
        }
    }

    /// Decodes one chunk's tensor, given the chunk's sample count and sample rate
    /// (used to derive `frameStride` and to convert frame indices to sample offsets).
    pub fn decode(
        &self,
        frame: &SegmentationFrame,
        chunk_samples: usize,
        sample_rate: u32,
    ) -> Result<Vec<LocalRegion>, SegmentationError> {
        let t_frames = frame.num_frames();
        if t_frames == 0 {
            return Ok(Vec::new());
        }
        if frame.activity.iter().any(|x| !x.is_finite()) {
            return Err(SegmentationError::NonFiniteActivity);
        }

        let frame_stride_seconds = (chunk_samples as f32 / sample_rate as f32) / t_frames as f32;
        let min_on_frames = (self.min_duration_on / frame_stride_seconds).ceil() as usize;
        let min_off_frames = (self.min_duration_off / frame_stride_seconds).ceil() as usize;

        let num_slots = frame.num_slots();
        let mut regions = Vec::new();

        for slot in 0..num_slots {
            let raw: Vec<f32> = (0..t_frames).map(|t| frame.activity[[t, slot]]).collect();
            let mut binary: Vec<bool> = raw.iter().map(|&v| v >= self.activity_threshold).collect();

            close_short_gaps(&mut binary, min_off_frames);
            remove_short_runs(&mut binary, min_on_frames);

            for (start, end) in on_runs(&binary) {
                let start_sample = ((start as f32) * frame_stride_seconds * sample_rate as f32) as usize;
                let end_sample =
                    (((end as f32) * frame_stride_seconds * sample_rate as f32) as usize).min(chunk_samples);
                let activity_score = raw[start..end].iter().copied().sum::<f32>() / (end - start) as f32;

                regions.push(LocalRegion {
                    slot,
                    start_sample,
                    end_sample,
                    activity_score,
                });
            }
        }

        regions.sort_by(|a, b| a.start_sample.cmp(&b.start_sample));
        Ok(regions)
    }
}

/// Sets `b[t] = true` for any `false`-run shorter than `min_off_frames`.
fn close_short_gaps(b: &mut [bool], min_off_frames: usize) {
    if min_off_frames == 0 {
        return;
    }
    let mut i = 0;
    while i < b.len() {
        if !b[i] {
            let run_start = i;
            while i < b.len() && !b[i] {
                i += 1;
            }
            let run_len = i - run_start;
            let bounded = run_start > 0 && i < b.len();
            if bounded && run_len < min_off_frames {
                for slot in b.iter_mut().take(i).skip(run_start) {
                    *slot = true;
                }
            }
        } else {
            i += 1;
        }
    }
}

/// Removes `true`-runs shorter than `min_on_frames`.
fn remove_short_runs(b: &mut [bool], min_on_frames: usize) {
    if min_on_frames == 0 {
        return;
    }
    let mut i = 0;
    while i < b.len() {
        if b[i] {
            let run_start = i;
            while i < b.len() && b[i] {
                i += 1;
            }
            let run_len = i - run_start;
            if run_len < min_on_frames {
                for slot in b.iter_mut().take(i).skip(run_start) {
                    *slot = false;
                }
            }
        } else {
            i += 1;
        }
    }
}

/// Extracts `(start, end)` index pairs for each contiguous `true`-run.
fn on_runs(b: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < b.len() {
        if b[i] {
            let start = i;
            while i < b.len() && b[i] {
                i += 1;
            }
            runs.push((start, i));
        } else {
            i += 1;
        }
    }
    runs
}
