//! External model collaborators (spec §6, §9).
//!
//! The original source dispatches across diarizer backends through a
//! protocol with a single concrete implementation. Per the redesign note in
//! §9, this exposes a narrow operation set — `segment` and `embed` — behind
//! plain traits rather than an open inheritance hierarchy, plus a single sum
//! type for selecting between backend implementations at construction time.
//! Model weights and inference themselves are out of scope; these traits are
//! the seam a real backend plugs into.

use crate::diarization::types::SegmentationFrame;
use crate::error::{EmbeddingExtractionError, SegmentationError};

/// Takes a `[N_samples]` waveform chunk and returns a `[T_frames, K_local]`
/// activity tensor. `T_frames` and `K_local` must be stable across calls.
pub trait SegmentationModel: Send + Sync {
    fn segment(&self, chunk_samples: &[f32], sample_rate: u32) -> Result<SegmentationFrame, SegmentationError>;
}

/// Takes a `[N_samples]` waveform region and returns a `[D]`-dimensional
/// embedding vector. `D` must be stable across calls.
pub trait EmbeddingModel: Send + Sync {
    fn embed(&self, region_samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, EmbeddingExtractionError>;
}

/// Selects between concrete model backends without open inheritance: a
/// closed sum type of variants behind the same two traits.
pub enum ModelBackend {
    External {
        segmentation: Box<dyn SegmentationModel>,
        embedding: Box<dyn EmbeddingModel>,
    },
}

impl ModelBackend {
    pub fn external(segmentation: Box<dyn SegmentationModel>, embedding: Box<dyn EmbeddingModel>) -> Self {
        ModelBackend::External {
            segmentation,
            embedding,
        }
    }

    pub fn segmentation(&self) -> &dyn SegmentationModel {
        match self {
            ModelBackend::External { segmentation, .. } => segmentation.as_ref(),
        }
    }

    pub fn embedding(&self) -> &dyn EmbeddingModel {
        match self {
            ModelBackend::External { embedding, .. } => embedding.as_ref(),
        }
    }
}

/// Deterministic fake backends for pipeline tests and benchmarks, standing
/// in for dataset fixtures and real model inference.
pub mod fakes {
    use super::*;

    /// A segmentation fake that reports one slot active whenever RMS energy
    /// in each frame window exceeds a fixed threshold — enough to drive
    /// pipeline tests deterministically without a real model.
    pub struct EnergyGateSegmentationModel {
        pub t_frames: usize,
        pub threshold: f32,
    }

    impl SegmentationModel for EnergyGateSegmentationModel {
        fn segment(&self, chunk_samples: &[f32], _sample_rate: u32) -> Result<SegmentationFrame, SegmentationError> {
            let frame_len = (chunk_samples.len() / self.t_frames).max(1);
            let mut activity = Vec::with_capacity(self.t_frames);
            for t in 0..self.t_frames {
                let start = t * frame_len;
                let end = (start + frame_len).min(chunk_samples.len());
                let window = &chunk_samples[start.min(chunk_samples.len())..end];
                let rms = if window.is_empty() {
                    0.0
                } else {
                    (window.iter().map(|x| x * x).sum::<f32>() / window.len() as f32).sqrt()
                };
                let value = if rms > self.threshold { 20.0 } else { 0.0 };
                activity.push(vec![value]);
            }
            Ok(SegmentationFrame::from_rows(activity))
        }
    }

    /// An embedding fake that derives a deterministic low-dimension vector
    /// from simple waveform statistics, so tests can distinguish "speakers"
    /// by amplitude without a real embedding network.
    pub struct StatisticalEmbeddingModel;

    impl EmbeddingModel for StatisticalEmbeddingModel {
        fn embed(&self, region_samples: &[f32], _sample_rate: u32) -> Result<Vec<f32>, EmbeddingExtractionError> {
            if region_samples.is_empty() {
                return Err(EmbeddingExtractionError::InferenceFailure);
            }
            let mean = region_samples.iter().sum::<f32>() / region_samples.len() as f32;
            let rms = (region_samples.iter().map(|x| x * x).sum::<f32>() / region_samples.len() as f32).sqrt();
            let peak = region_samples.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
            Ok(vec![mean, rms, peak])
        }
    }
}
