//! Configuration surface (spec §6).
//!
//! Follows the teacher's `DiarizationConfig` pattern: doc-commented fields,
//! a `Default` impl carrying the spec's documented defaults, and
//! `serde`-derived (de)serialization so the struct can be loaded from a
//! config file or built programmatically with `..Default::default()`.

use serde::{Deserialize, Serialize};

/// Configuration for the speaker registry and chunked streaming pipeline.
///
/// # Examples
///
/// ```rust
/// use diarbench::config::DiarizationConfig;
///
/// let config = DiarizationConfig {
///     assignment_threshold: 0.8,
///     max_speakers: Some(4),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationConfig {
    /// Maximum cosine distance allowing assignment to an existing prototype (θ_a).
    pub assignment_threshold: f32,

    /// Maximum cosine distance allowing the prototype to be blended with a
    /// new embedding (θ_u). Always ≤ `assignment_threshold`.
    pub update_threshold: f32,

    /// Blending factor (α) used when updating a matched prototype.
    pub update_weight: f32,

    /// Legacy alias for `assignment_threshold`. When `Some`, overrides it —
    /// kept for configs written against the older single-threshold scheme.
    pub clustering_threshold: Option<f32>,

    /// Optional cap on the number of distinct speakers the registry will create.
    pub max_speakers: Option<usize>,

    /// Minimum duration (seconds) an on-run must sustain to survive smoothing.
    pub min_duration_on: f32,

    /// Minimum duration (seconds) an off-run (gap) must sustain to not be closed.
    pub min_duration_off: f32,

    /// Activity threshold τ applied to the segmentation tensor after the
    /// logistic/threshold adapter.
    pub min_activity_threshold: f32,

    /// Chunk length in seconds.
    pub chunk_duration_seconds: f32,

    /// Overlap between consecutive chunks, in seconds. Hop = chunk − overlap.
    pub overlap_seconds: f32,

    /// Minimum region duration (seconds) below which a region is skipped
    /// instead of extracted into an embedding (§4.4).
    pub min_region_duration_seconds: f32,

    /// Verbose per-chunk tracing.
    pub debug_mode: bool,
}

impl DiarizationConfig {
    /// Effective assignment threshold after applying the legacy alias override.
    pub fn effective_assignment_threshold(&self) -> f32 {
        self.clustering_threshold.unwrap_or(self.assignment_threshold)
    }

    /// Hop in seconds between successive chunk starts.
    pub fn hop_seconds(&self) -> f32 {
        self.chunk_duration_seconds - self.overlap_seconds
    }
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            assignment_threshold: 0.84,
            update_threshold: 0.56,
            update_weight: 0.1,
            clustering_threshold: None,
            max_speakers: None,
            min_duration_on: 1.0,
            min_duration_off: 0.5,
            min_activity_threshold: 10.0,
            chunk_duration_seconds: 10.0,
            overlap_seconds: 0.0,
            min_region_duration_seconds: 0.5,
            debug_mode: false,
        }
    }
}

/// Configuration for the benchmark driver (§4.9, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Dataset identifier, used only for reporting (dataset download/extraction is out of scope).
    pub dataset: String,

    /// Number of repeated iterations per recording, used to estimate DER standard deviation.
    pub iterations: usize,

    /// Maximum acceptable average DER (%) before the run is marked failed.
    pub der_threshold: f64,

    /// Maximum acceptable average JER (%).
    pub jer_threshold: f64,

    /// Maximum acceptable average real-time factor (processing time / audio duration).
    pub rtf_threshold: f64,

    /// Restrict the run to a single recording identifier, if set.
    pub single_file: Option<String>,

    /// Optional path to write the JSON result record to.
    pub output_path: Option<String>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            dataset: "default".to_string(),
            iterations: 1,
            der_threshold: 30.0,
            jer_threshold: 40.0,
            rtf_threshold: 1.0,
            single_file: None,
            output_path: None,
        }
    }
}
