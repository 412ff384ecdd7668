//! Core data model for the chunked streaming diarization pipeline (spec §3).
//!
//! Mirrors the teacher's `SpeakerEmbedding`/`SpeakerSegment` shape — an
//! embedding carries a quality score derived from its pre-normalization
//! magnitude, and segments are timestamped relative to the recording rather
//! than the chunk.

use serde::{Deserialize, Serialize};

/// A fixed-dimension embedding vector, normalized to unit length on ingress.
///
/// # Examples
///
/// ```rust
/// use diarbench::diarization::types::Embedding;
///
/// let e = Embedding::from_raw(vec![3.0, 4.0], 1.2);
/// assert!((e.vector[0] - 0.6).abs() < 1e-6);
/// assert_eq!(e.dimension(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub quality: f32,
    pub duration_seconds: f32,
}

impl Embedding {
    /// Builds an embedding from a raw (pre-normalization) vector, normalizing
    /// it and deriving its quality score from the raw magnitude.
    pub fn from_raw(raw: Vec<f32>, duration_seconds: f32) -> Self {
        let quality = crate::diarization::embedding_algebra::quality(&raw);
        let vector = crate::diarization::embedding_algebra::normalize(&raw);
        Self {
            vector,
            quality,
            duration_seconds,
        }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A persistent speaker identity maintained by the speaker registry (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerPrototype {
    pub id: String,
    pub prototype: Vec<f32>,
    pub creation_time_seconds: f32,
    pub observation_count: u64,
}

/// A per-time-step activity tensor produced by an external segmentation model
/// for one chunk: `activity[[t, k]]` is slot `k`'s raw activity at frame `t`.
#[derive(Debug, Clone)]
pub struct SegmentationFrame {
    pub activity: ndarray::Array2<f32>,
}

impl SegmentationFrame {
    /// Builds a frame from row-major `[T_frames, K_local]` rows, as produced
    /// by an external model's per-frame output. Rows must be equal length;
    /// an empty input yields a `0x0` frame.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Self {
        let t_frames = rows.len();
        let k_local = rows.first().map(|row| row.len()).unwrap_or(0);
        let mut activity = ndarray::Array2::zeros((t_frames, k_local));
        for (t, row) in rows.into_iter().enumerate() {
            for (k, value) in row.into_iter().enumerate() {
                activity[[t, k]] = value;
            }
        }
        Self { activity }
    }

    pub fn num_frames(&self) -> usize {
        self.activity.nrows()
    }

    pub fn num_slots(&self) -> usize {
        self.activity.ncols()
    }
}

/// A contiguous active run for one local slot within a single chunk (§4.3).
///
/// Slot indices and sample offsets are local to the chunk that produced
/// them; they carry no meaning once the chunk has been processed.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRegion {
    pub slot: usize,
    pub start_sample: usize,
    pub end_sample: usize,
    pub activity_score: f32,
}

impl LocalRegion {
    pub fn duration_seconds(&self, sample_rate: u32) -> f32 {
        (self.end_sample - self.start_sample) as f32 / sample_rate as f32
    }
}

/// The output unit emitted by the chunked streaming pipeline (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedSpeakerSegment {
    pub speaker_id: String,
    pub start_seconds: f32,
    pub end_seconds: f32,
    pub embedding: Embedding,
    pub quality_score: f32,
}

impl TimedSpeakerSegment {
    pub fn duration_seconds(&self) -> f32 {
        self.end_seconds - self.start_seconds
    }

    pub fn overlaps(&self, other: &TimedSpeakerSegment) -> bool {
        self.start_seconds < other.end_seconds && other.start_seconds < self.end_seconds
    }
}

/// Sentinel speaker id returned for an invalid embedding (§4.2's failure semantics).
/// The pipeline filters segments carrying this id before emission.
pub const UNVOICED_SPEAKER_ID: &str = "__unvoiced__";
