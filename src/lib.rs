//! Streaming speaker diarization with a DER/JER evaluation harness.
//!
//! The chunked pipeline (`diarization`) segments audio, extracts speaker
//! embeddings, and assigns speaker identities online as each chunk is
//! processed. The `eval` and `benchmark` modules turn predicted segments
//! and reference annotations into diarization error metrics across a set
//! of recordings.

pub mod audio;
pub mod benchmark;
pub mod config;
pub mod diarization;
pub mod error;
pub mod eval;
pub mod text;
