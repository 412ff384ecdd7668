//! Chunked streaming diarization pipeline (spec §4.5).
//!
//! Replaces the teacher's `DiarizationPipeline`, which detected speaker
//! changes from windowed acoustic features (RMS/ZCR/spectral centroid), with
//! the spec's tensor-driven state machine: Idle → Segmenting → Embedding →
//! Registering → Emitting per chunk, timestamp-shifted by the chunk's hop
//! offset, coalescing same-speaker segments across chunk boundaries the way
//! the teacher's `SegmentMerger::merge_same_speaker_segments` coalesces
//! transcript/speaker segments — adapted here to coalesce a predicted
//! speaker's own adjacent regions instead of merging against a second track.

use crate::audio::types::AudioTrack;
use crate::config::DiarizationConfig;
use crate::diarization::embedder::EmbeddingExtractor;
use crate::diarization::external::ModelBackend;
use crate::diarization::registry::SpeakerRegistry;
use crate::diarization::segmentation::SegmentationDecoder;
use crate::diarization::types::{TimedSpeakerSegment, UNVOICED_SPEAKER_ID};
use crate::error::PipelineError;
use tracing::{info, warn};

/// Per-chunk timing breakdown accumulated across a recording (grounds the
/// teacher's `ProcessingMetrics`).
#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    pub segmentation_seconds: f64,
    pub embedding_seconds: f64,
    pub clustering_seconds: f64,
    pub chunk_latencies_seconds: Vec<f64>,
}

impl PipelineTimings {
    pub fn total_seconds(&self) -> f64 {
        self.segmentation_seconds + self.embedding_seconds + self.clustering_seconds
    }

    pub fn latency_percentile(&self, percentile: f64) -> f64 {
        if self.chunk_latencies_seconds.is_empty() {
            return 0.0;
        }
        let mut sorted = self.chunk_latencies_seconds.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let rank = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[rank.min(sorted.len() - 1)]
    }
}

/// Runs the chunked streaming pipeline over one recording's audio track.
pub struct DiarizationPipeline<'a> {
    config: DiarizationConfig,
    decoder: SegmentationDecoder,
    backend: &'a ModelBackend,
    registry: SpeakerRegistry,
    segments: Vec<TimedSpeakerSegment>,
    timings: PipelineTimings,
    warning_count: u64,
}

impl<'a> DiarizationPipeline<'a> {
    pub fn new(config: DiarizationConfig, backend: &'a ModelBackend) -> Self {
        let decoder = SegmentationDecoder::new(&config);
        let registry = SpeakerRegistry::new(&config);
        info!(
            chunk_duration_seconds = config.chunk_duration_seconds,
            overlap_seconds = config.overlap_seconds,
            "initializing diarization pipeline"
        );
        Self {
            config,
            decoder,
            backend,
            registry,
            segments: Vec::new(),
            timings: PipelineTimings::default(),
            warning_count: 0,
        }
    }

    pub fn timings(&self) -> &PipelineTimings {
        &self.timings
    }

    pub fn warning_count(&self) -> u64 {
        self.warning_count
    }

    /// Runs every chunk of `track` through the state machine and returns the
    /// recording's coalesced, chronologically ordered segment list.
    pub fn run(&mut self, track: &AudioTrack) -> Result<&[TimedSpeakerSegment], PipelineError> {
        if track.samples.is_empty() {
            return Err(PipelineError::InvalidInput {
                message: "empty audio track".to_string(),
            });
        }

        let chunks = track.into_chunks(self.config.chunk_duration_seconds, self.config.hop_seconds());

        for chunk in &chunks {
            match self.process_chunk(chunk) {
                Ok(mut emitted) => self.segments.append(&mut emitted),
                Err(err) => {
                    warn!(chunk_index = chunk.index, error = %err, "chunk failed, skipping");
                    self.warning_count += 1;
                }
            }
        }

        self.coalesce();
        Ok(&self.segments)
    }

    /// Idle → Segmenting → Embedding → Registering → Emitting for one chunk.
    fn process_chunk(
        &mut self,
        chunk: &crate::audio::types::AudioChunk,
    ) -> Result<Vec<TimedSpeakerSegment>, PipelineError> {
        let started = std::time::Instant::now();

        // Segmenting
        let segmenting_started = std::time::Instant::now();
        let frame = self
            .backend
            .segmentation()
            .segment(&chunk.samples, chunk.sample_rate)
            .map_err(PipelineError::Segmentation)?;
        let regions = self
            .decoder
            .decode(&frame, chunk.samples.len(), chunk.sample_rate)
            .map_err(PipelineError::Segmentation)?;
        self.timings.segmentation_seconds += segmenting_started.elapsed().as_secs_f64();

        // Embedding
        let embedding_started = std::time::Instant::now();
        let extractor = EmbeddingExtractor::new(self.backend.embedding(), &self.config);
        let mut emitted = Vec::with_capacity(regions.len());
        for region in &regions {
            let embedding = match extractor.extract(region, &chunk.samples, chunk.sample_rate) {
                Ok(Some(e)) => e,
                Ok(None) => continue,
                Err(err) => {
                    warn!(chunk_index = chunk.index, error = %err, "embedding extraction failed for region");
                    self.warning_count += 1;
                    continue;
                }
            };

            // Registering
            let clustering_started = std::time::Instant::now();
            let region_time = chunk.start_seconds + region.start_sample as f32 / chunk.sample_rate as f32;
            let speaker_id = self.registry.assign_or_create(&embedding, region_time);
            self.timings.clustering_seconds += clustering_started.elapsed().as_secs_f64();

            if speaker_id == UNVOICED_SPEAKER_ID {
                continue;
            }

            // Emitting, timestamps shifted by the chunk's start offset.
            let start_seconds = chunk.start_seconds + region.start_sample as f32 / chunk.sample_rate as f32;
            let end_seconds = chunk.start_seconds + region.end_sample as f32 / chunk.sample_rate as f32;
            emitted.push(TimedSpeakerSegment {
                speaker_id,
                start_seconds,
                end_seconds,
                quality_score: embedding.quality,
                embedding,
            });
        }
        self.timings.embedding_seconds += embedding_started.elapsed().as_secs_f64();

        emitted.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
        self.timings.chunk_latencies_seconds.push(started.elapsed().as_secs_f64());
        Ok(emitted)
    }

    /// Coalesces same-speaker segments whose timestamps overlap or abut
    /// across chunk boundaries, taking `(min start, max end)`.
    fn coalesce(&mut self) {
        self.segments.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

        let mut coalesced: Vec<TimedSpeakerSegment> = Vec::with_capacity(self.segments.len());
        for segment in self.segments.drain(..) {
            if let Some(last) = coalesced
                .iter_mut()
                .rev()
                .find(|s: &&mut TimedSpeakerSegment| s.speaker_id == segment.speaker_id)
            {
                if segment.start_seconds <= last.end_seconds {
                    last.end_seconds = last.end_seconds.max(segment.end_seconds);
                    if segment.quality_score > last.quality_score {
                        last.quality_score = segment.quality_score;
                        last.embedding = segment.embedding;
                    }
                    continue;
                }
            }
            coalesced.push(segment);
        }

        coalesced.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
        self.segments = coalesced;
    }
}
