//! Benchmark driver: per-recording orchestration and cross-recording
//! aggregation (spec §4.9).

use crate::benchmark::types::{AggregateReport, MetricStats, RecordingResult, RecordingTimings};
use crate::config::{BenchmarkConfig, DiarizationConfig};
use crate::diarization::external::ModelBackend;
use crate::diarization::pipeline::DiarizationPipeline;
use crate::diarization::types::TimedSpeakerSegment;
use crate::error::ThresholdExceeded;
use crate::eval::assignment::{first_occurrence_mapping, hungarian_mapping};
use crate::eval::metrics::evaluate;
use anyhow::Context;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{info, warn};

/// One recording's raw inputs: a decoded audio track and, if available, the
/// parsed reference segments (§4.6's annotation loader is applied upstream —
/// audio and annotation decoding themselves are external concerns, §6).
pub struct RecordingInput {
    pub id: String,
    pub track: crate::audio::types::AudioTrack,
    pub reference: Option<Vec<TimedSpeakerSegment>>,
}

/// Whether the mapping mode matches an online (first-occurrence) pipeline
/// or an offline one (Hungarian) — §4.9 step 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingMode {
    Streaming,
    Batch,
}

/// Runs the full pipeline + evaluation for one recording.
pub fn run_recording(
    input: &RecordingInput,
    backend: &ModelBackend,
    diarization_config: &DiarizationConfig,
    mapping_mode: MappingMode,
) -> Result<RecordingResult, crate::error::PipelineError> {
    let audio_load_started = Instant::now();
    let total_duration_seconds = input.track.duration_seconds();
    let audio_load_seconds = audio_load_started.elapsed().as_secs_f64();

    let mut pipeline = DiarizationPipeline::new(diarization_config.clone(), backend);
    let processing_started = Instant::now();
    let predicted = pipeline.run(&input.track)?.to_vec();
    let processing_seconds = processing_started.elapsed().as_secs_f64();

    let timings = &pipeline.timings();
    let recording_timings = RecordingTimings {
        model_load_seconds: 0.0,
        audio_load_seconds,
        segmentation_seconds: timings.segmentation_seconds,
        embedding_seconds: timings.embedding_seconds,
        clustering_seconds: timings.clustering_seconds,
        total_seconds: timings.total_seconds() + audio_load_seconds,
    };

    // §7: AnnotationMissing downgrades the recording to timing-only instead
    // of evaluating against a fabricated empty reference.
    let evaluation = input.reference.as_ref().map(|reference| {
        let mapping = match mapping_mode {
            MappingMode::Streaming => first_occurrence_mapping(&predicted, reference),
            MappingMode::Batch => hungarian_mapping(&predicted, reference, total_duration_seconds),
        };
        evaluate(&predicted, reference, total_duration_seconds, &mapping)
    });

    let detected_speakers: HashSet<&str> = predicted.iter().map(|s| s.speaker_id.as_str()).collect();
    let reference_speakers: HashSet<&str> = input
        .reference
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|s| s.speaker_id.as_str())
        .collect();

    let rtfx = if processing_seconds > 0.0 {
        total_duration_seconds as f64 / processing_seconds
    } else {
        0.0
    };

    Ok(RecordingResult {
        meeting: input.id.clone(),
        der: evaluation.as_ref().map(|e| e.der),
        jer: evaluation.as_ref().map(|e| e.jer),
        miss_rate: evaluation.as_ref().map(|e| e.miss_rate),
        false_alarm_rate: evaluation.as_ref().map(|e| e.false_alarm_rate),
        speaker_error_rate: evaluation.as_ref().map(|e| e.confusion_rate),
        rtfx,
        processing_seconds,
        chunks_processed: timings.chunk_latencies_seconds.len(),
        detected_speakers: detected_speakers.len(),
        reference_speakers: reference_speakers.len(),
        speaker_fragmentation: speaker_fragmentation(&predicted),
        latency90_seconds: timings.latency_percentile(90.0),
        latency99_seconds: timings.latency_percentile(99.0),
        timings: recording_timings,
    })
}

/// `(total run count across all predicted speakers) / (number of predicted
/// speakers)`, per §9's fixed normalization. Since the pipeline already
/// coalesces touching same-speaker segments (§4.5), each surviving segment
/// is itself one non-consecutive appearance run.
fn speaker_fragmentation(predicted: &[TimedSpeakerSegment]) -> f64 {
    let mut runs_per_speaker: HashMap<&str, usize> = HashMap::new();
    for segment in predicted {
        *runs_per_speaker.entry(segment.speaker_id.as_str()).or_insert(0) += 1;
    }
    if runs_per_speaker.is_empty() {
        return 1.0;
    }
    let total_runs: usize = runs_per_speaker.values().sum();
    total_runs as f64 / runs_per_speaker.len() as f64
}

/// Runs every recording, aggregates per-metric mean/stddev, and flags
/// threshold violations (§4.9, §7).
pub fn run_benchmark(
    recordings: &[RecordingInput],
    backend: &ModelBackend,
    diarization_config: &DiarizationConfig,
    benchmark_config: &BenchmarkConfig,
    mapping_mode: MappingMode,
) -> AggregateReport {
    let mut results = Vec::new();
    let mut failed = Vec::new();

    for recording in recordings {
        if let Some(single) = &benchmark_config.single_file {
            if single != &recording.id {
                continue;
            }
        }

        match run_recording(recording, backend, diarization_config, mapping_mode) {
            Ok(result) => results.push(result),
            Err(err) => {
                warn!(recording = %recording.id, error = %err, "recording failed, skipping");
                failed.push(recording.id.clone());
            }
        }
    }

    aggregate(results, failed, benchmark_config)
}

/// Runs every recording concurrently as an independent task (§5's
/// concurrency model: each recording owns its own registry and segment
/// list, so tasks share no mutable state beyond the read-only model
/// backend). Per-recording work is synchronous/cooperative, so each task
/// runs on a blocking-pool thread rather than cooperatively yielding.
pub async fn run_benchmark_concurrent(
    recordings: Vec<RecordingInput>,
    backend: std::sync::Arc<ModelBackend>,
    diarization_config: DiarizationConfig,
    benchmark_config: BenchmarkConfig,
    mapping_mode: MappingMode,
) -> AggregateReport {
    let mut handles = Vec::new();

    for recording in recordings {
        if let Some(single) = &benchmark_config.single_file {
            if single != &recording.id {
                continue;
            }
        }

        let backend = backend.clone();
        let diarization_config = diarization_config.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let id = recording.id.clone();
            (id, run_recording(&recording, &backend, &diarization_config, mapping_mode))
        }));
    }

    let mut results = Vec::new();
    let mut failed = Vec::new();
    for handle in handles {
        match handle.await {
            Ok((_, Ok(result))) => results.push(result),
            Ok((id, Err(err))) => {
                warn!(recording = %id, error = %err, "recording failed, skipping");
                failed.push(id);
            }
            Err(join_err) => {
                warn!(error = %join_err, "recording task panicked");
            }
        }
    }

    aggregate(results, failed, &benchmark_config)
}

fn aggregate(
    results: Vec<RecordingResult>,
    failed: Vec<String>,
    benchmark_config: &BenchmarkConfig,
) -> AggregateReport {
    // §7: aggregate averages are taken over completed-with-annotation
    // recordings only; timing-only (annotation-missing) recordings still
    // appear in `results` but are excluded from the DER/JER means.
    let annotated: Vec<&RecordingResult> = results.iter().filter(|r| r.der.is_some()).collect();
    let der = MetricStats::from_samples(&annotated.iter().filter_map(|r| r.der).collect::<Vec<_>>());
    let jer = MetricStats::from_samples(&annotated.iter().filter_map(|r| r.jer).collect::<Vec<_>>());
    let rtfx = MetricStats::from_samples(&results.iter().map(|r| r.rtfx).collect::<Vec<_>>());

    let observed_rtf = if rtfx.mean > 0.0 { 1.0 / rtfx.mean } else { 0.0 };
    let threshold_exceeded = der.mean > benchmark_config.der_threshold
        || jer.mean > benchmark_config.jer_threshold
        || observed_rtf > benchmark_config.rtf_threshold;

    info!(
        recordings = results.len(),
        failed = failed.len(),
        der_mean = der.mean,
        jer_mean = jer.mean,
        "benchmark run complete"
    );

    AggregateReport {
        recordings: results,
        failed_recordings: failed,
        der,
        jer,
        rtfx,
        threshold_exceeded,
        generated_at: String::new(),
    }
    .stamped()
}

/// Writes `report` as pretty-printed JSON to `benchmark_config.output_path`,
/// if set. A no-op when no output path is configured.
pub fn write_report(report: &AggregateReport, benchmark_config: &BenchmarkConfig) -> anyhow::Result<()> {
    let Some(path) = &benchmark_config.output_path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(report).context("serializing benchmark report")?;
    std::fs::write(path, json).with_context(|| format!("writing benchmark report to {path}"))?;
    Ok(())
}

/// Checks an aggregate report against configured thresholds, returning the
/// first violated threshold as an error (§7's `ThresholdExceeded`).
pub fn check_thresholds(report: &AggregateReport, config: &BenchmarkConfig) -> Result<(), ThresholdExceeded> {
    if report.der.mean > config.der_threshold {
        return Err(ThresholdExceeded {
            metric: "der".to_string(),
            observed: report.der.mean,
            max: config.der_threshold,
        });
    }
    if report.jer.mean > config.jer_threshold {
        return Err(ThresholdExceeded {
            metric: "jer".to_string(),
            observed: report.jer.mean,
            max: config.jer_threshold,
        });
    }
    let observed_rtf = if report.rtfx.mean > 0.0 { 1.0 / report.rtfx.mean } else { f64::INFINITY };
    if observed_rtf > config.rtf_threshold {
        return Err(ThresholdExceeded {
            metric: "rtf".to_string(),
            observed: observed_rtf,
            max: config.rtf_threshold,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diarization::external::fakes::{EnergyGateSegmentationModel, StatisticalEmbeddingModel};

    fn backend() -> ModelBackend {
        ModelBackend::external(
            Box::new(EnergyGateSegmentationModel {
                t_frames: 50,
                threshold: 0.05,
            }),
            Box::new(StatisticalEmbeddingModel),
        )
    }

    fn sine_track(duration_seconds: f32) -> crate::audio::types::AudioTrack {
        let sample_rate = 16_000u32;
        let n = (sample_rate as f32 * duration_seconds) as usize;
        let samples = (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * 200.0 * t).sin() * 0.5
            })
            .collect();
        crate::audio::types::AudioTrack { samples, sample_rate }
    }

    #[test]
    fn run_recording_without_reference_skips_evaluation_but_succeeds() {
        let backend = backend();
        let input = RecordingInput {
            id: "rec1".to_string(),
            track: sine_track(5.0),
            reference: None,
        };
        let result = run_recording(&input, &backend, &DiarizationConfig::default(), MappingMode::Streaming).unwrap();
        assert_eq!(result.meeting, "rec1");
        assert_eq!(result.reference_speakers, 0);
        assert!(result.der.is_none());
        assert!(result.jer.is_none());
        assert!(result.miss_rate.is_none());
        assert!(result.false_alarm_rate.is_none());
        assert!(result.speaker_error_rate.is_none());
    }

    #[test]
    fn annotation_missing_recording_is_excluded_from_aggregate_means() {
        let backend = backend();
        let with_annotation = RecordingInput {
            id: "rec1".to_string(),
            track: sine_track(5.0),
            reference: Some(vec![crate::diarization::types::TimedSpeakerSegment {
                speaker_id: "A".to_string(),
                start_seconds: 0.0,
                end_seconds: 5.0,
                embedding: crate::diarization::types::Embedding::from_raw(vec![], 0.0),
                quality_score: 1.0,
            }]),
        };
        let without_annotation = RecordingInput {
            id: "rec2".to_string(),
            track: sine_track(5.0),
            reference: None,
        };
        let report = run_benchmark(
            &[with_annotation, without_annotation],
            &backend,
            &DiarizationConfig::default(),
            &BenchmarkConfig::default(),
            MappingMode::Streaming,
        );
        assert_eq!(report.recordings.len(), 2);
        assert!(report.recordings.iter().any(|r| r.meeting == "rec2" && r.der.is_none()));
    }

    #[test]
    fn threshold_check_passes_for_lenient_config() {
        let backend = backend();
        let input = RecordingInput {
            id: "rec1".to_string(),
            track: sine_track(5.0),
            reference: None,
        };
        let config = BenchmarkConfig {
            der_threshold: 100.0,
            jer_threshold: 100.0,
            rtf_threshold: 1000.0,
            ..Default::default()
        };
        let report = run_benchmark(&[input], &backend, &DiarizationConfig::default(), &config, MappingMode::Streaming);
        assert!(check_thresholds(&report, &config).is_ok());
    }

    #[test]
    fn single_file_filter_skips_non_matching_recordings() {
        let backend = backend();
        let recordings = vec![
            RecordingInput {
                id: "rec1".to_string(),
                track: sine_track(2.0),
                reference: None,
            },
            RecordingInput {
                id: "rec2".to_string(),
                track: sine_track(2.0),
                reference: None,
            },
        ];
        let config = BenchmarkConfig {
            single_file: Some("rec2".to_string()),
            ..Default::default()
        };
        let report = run_benchmark(&recordings, &backend, &DiarizationConfig::default(), &config, MappingMode::Streaming);
        assert_eq!(report.recordings.len(), 1);
        assert_eq!(report.recordings[0].meeting, "rec2");
    }

    #[tokio::test]
    async fn concurrent_runner_aggregates_independent_recordings() {
        let backend = std::sync::Arc::new(backend());
        let recordings = vec![
            RecordingInput {
                id: "rec1".to_string(),
                track: sine_track(2.0),
                reference: None,
            },
            RecordingInput {
                id: "rec2".to_string(),
                track: sine_track(2.0),
                reference: None,
            },
        ];
        let report = run_benchmark_concurrent(
            recordings,
            backend,
            DiarizationConfig::default(),
            BenchmarkConfig::default(),
            MappingMode::Streaming,
        )
        .await;
        assert_eq!(report.recordings.len(), 2);
        assert!(report.failed_recordings.is_empty());
    }

    #[test]
    fn write_report_is_a_no_op_without_an_output_path() {
        let report = AggregateReport::default();
        let config = BenchmarkConfig::default();
        assert!(write_report(&report, &config).is_ok());
    }

    #[test]
    fn write_report_writes_json_to_the_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = AggregateReport::default().stamped();
        let config = BenchmarkConfig {
            output_path: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        };

        write_report(&report, &config).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"generated_at\""));
    }
}
