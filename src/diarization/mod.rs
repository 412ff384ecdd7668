//! Streaming speaker diarization: embedding algebra, the speaker registry,
//! the segmentation decoder, and the chunked pipeline that orchestrates them.

pub mod embedder;
pub mod embedding_algebra;
pub mod external;
pub mod pipeline;
pub mod registry;
pub mod segmentation;
pub mod types;

pub use pipeline::{DiarizationPipeline, PipelineTimings};
pub use types::{Embedding, LocalRegion, SpeakerPrototype, TimedSpeakerSegment};
