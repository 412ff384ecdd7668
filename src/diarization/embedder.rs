//! Embedding extractor wrapper (spec §4.4).
//!
//! Replaces the teacher's `SpeakerEmbedder`, which wrapped an `ort` ONNX
//! session directly, with a thin wrapper over the [`EmbeddingModel`] trait
//! seam (§6) — the model call itself is an opaque external collaborator.

use crate::config::DiarizationConfig;
use crate::diarization::external::EmbeddingModel;
use crate::diarization::types::{Embedding, LocalRegion};
use crate::error::EmbeddingExtractionError;
use tracing::warn;

pub struct EmbeddingExtractor<'a> {
    model: &'a dyn EmbeddingModel,
    min_region_duration_seconds: f32,
}

impl<'a> EmbeddingExtractor<'a> {
    pub fn new(model: &'a dyn EmbeddingModel, config: &DiarizationConfig) -> Self {
        Self {
            model,
            min_region_duration_seconds: config.min_region_duration_seconds,
        }
    }

    /// Extracts an embedding for `region`'s audio span within `chunk_samples`.
    ///
    /// Returns `Ok(None)` (not an error) when the region is shorter than the
    /// configured minimum duration — per §4.4's failure semantics, the
    /// region is silently skipped rather than surfaced as a pipeline failure.
    pub fn extract(
        &self,
        region: &LocalRegion,
        chunk_samples: &[f32],
        sample_rate: u32,
    ) -> Result<Option<Embedding>, EmbeddingExtractionError> {
        let duration_seconds = region.duration_seconds(sample_rate);
        if duration_seconds < self.min_region_duration_seconds {
            warn!(
                duration_seconds,
                minimum_seconds = self.min_region_duration_seconds,
                "skipping region shorter than minimum duration"
            );
            return Ok(None);
        }

        let start = region.start_sample.min(chunk_samples.len());
        let end = region.end_sample.min(chunk_samples.len());
        let span = &chunk_samples[start..end];

        let raw = self.model.embed(span, sample_rate)?;
        Ok(Some(Embedding::from_raw(raw, duration_seconds)))
    }
}
