//! Benchmark result record shapes (spec §4.9, §6).
//!
//! Grounds the teacher's `ProcessingMetrics`/`DiarizationStatistics` pair:
//! a per-recording timing breakdown plus a cross-recording aggregate with
//! mean and standard deviation per metric.

use serde::{Deserialize, Serialize};

/// Wall-clock breakdown for one recording's pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingTimings {
    pub model_load_seconds: f64,
    pub audio_load_seconds: f64,
    pub segmentation_seconds: f64,
    pub embedding_seconds: f64,
    pub clustering_seconds: f64,
    pub total_seconds: f64,
}

/// One recording's evaluation record, serialized as the interchange result
/// record described in §6.
///
/// `der`/`jer`/`miss_rate`/`false_alarm_rate`/`speaker_error_rate` are `None`
/// when the recording has no reference annotation (§7's `AnnotationMissing`
/// downgrades the recording to timing-only rather than folding a spurious
/// all-false-alarm score into the aggregate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingResult {
    pub meeting: String,
    pub der: Option<f64>,
    pub jer: Option<f64>,
    pub miss_rate: Option<f64>,
    pub false_alarm_rate: Option<f64>,
    pub speaker_error_rate: Option<f64>,
    pub rtfx: f64,
    pub processing_seconds: f64,
    pub chunks_processed: usize,
    pub detected_speakers: usize,
    pub reference_speakers: usize,
    pub speaker_fragmentation: f64,
    pub latency90_seconds: f64,
    pub latency99_seconds: f64,
    pub timings: RecordingTimings,
}

/// Mean and standard deviation for one metric across recordings/iterations.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub stddev: f64,
}

impl MetricStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        Self {
            mean,
            stddev: variance.sqrt(),
        }
    }
}

/// Cross-recording aggregate, plus the list of recordings that failed to
/// complete or lacked annotations (§7's propagation policy).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateReport {
    pub recordings: Vec<RecordingResult>,
    pub failed_recordings: Vec<String>,
    pub der: MetricStats,
    pub jer: MetricStats,
    pub rtfx: MetricStats,
    pub threshold_exceeded: bool,
    /// RFC 3339 timestamp of when the run completed, stamped once results
    /// are in hand rather than when the run started.
    pub generated_at: String,
}

impl AggregateReport {
    pub fn stamped(mut self) -> Self {
        self.generated_at = chrono::Utc::now().to_rfc3339();
        self
    }
}
