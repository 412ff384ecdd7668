//! Crate-wide error taxonomy.
//!
//! Each subsystem gets its own `thiserror` enum, mirroring the split the
//! teacher keeps between `DiarizationError` and `ASRError`. `PipelineError`
//! composes the subsystem errors that can surface from the chunked
//! streaming pipeline; callers that only need a single error type at an
//! orchestration boundary can convert into `anyhow::Error` with `?`.

use thiserror::Error;

/// Errors raised by the embedding algebra and speaker registry (§4.1, §4.2).
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("embedding is invalid: non-finite component or near-zero magnitude")]
    InvalidEmbedding,

    #[error("speaker registry has no prototypes to match against")]
    EmptyRegistry,
}

/// Errors raised by the segmentation decoder (§4.3).
#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("segmentation tensor shape mismatch: expected {expected_frames} frames, got {actual_frames}")]
    ShapeMismatch {
        expected_frames: usize,
        actual_frames: usize,
    },

    #[error("segmentation inference returned non-finite activity values")]
    NonFiniteActivity,
}

/// Errors raised by the embedding extractor wrapper (§4.4).
#[derive(Debug, Error)]
pub enum EmbeddingExtractionError {
    #[error("region shorter than minimum duration: {duration_seconds:.3}s < {minimum_seconds:.3}s")]
    EmptyRegion {
        duration_seconds: f32,
        minimum_seconds: f32,
    },

    #[error("embedding model returned a wrong-shape or non-finite vector")]
    InferenceFailure,
}

/// Errors raised while loading reference annotations (§4.6).
#[derive(Debug, Error)]
pub enum GroundTruthError {
    #[error("annotation source not found for recording {recording_id}")]
    AnnotationMissing { recording_id: String },

    #[error("malformed annotation XML: {message}")]
    MalformedXml { message: String },

    #[error("unknown speaker code {code} referenced in turn list (not present in session mapping)")]
    UnknownSpeakerCode { code: String },
}

/// Errors raised by the chunked streaming pipeline (§4.5, §7).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("segmentation model unavailable or incompatible: {message}")]
    ModelUnavailable { message: String },

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingExtractionError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Raised when an aggregate benchmark run exceeds its configured thresholds (§6, §7).
#[derive(Debug, Error)]
#[error("threshold exceeded: {metric} average {observed:.2} > max {max:.2}")]
pub struct ThresholdExceeded {
    pub metric: String,
    pub observed: f64,
    pub max: f64,
}
