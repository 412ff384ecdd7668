//! Text normalization and edit distance (ASR word-error-rate adjunct, §2 item 10).

pub mod edit_distance;
pub mod normalizer;
