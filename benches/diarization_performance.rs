//! Performance benchmarks for the chunked diarization pipeline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use diarbench::config::DiarizationConfig;
use diarbench::diarization::external::fakes::{EnergyGateSegmentationModel, StatisticalEmbeddingModel};
use diarbench::diarization::external::ModelBackend;
use diarbench::diarization::pipeline::DiarizationPipeline;
use diarbench::audio::types::AudioTrack;
use rand::Rng;

/// Synthetic meeting audio with a light noise floor layered under the tone,
/// so the segmentation fake's energy gate has to do real thresholding work
/// instead of deciding against an exactly-zero silence baseline.
fn meeting_audio(duration_seconds: usize, speaker_count: usize) -> AudioTrack {
    let sample_rate = 16_000u32;
    let num_samples = duration_seconds * sample_rate as usize;
    let segment_seconds = (duration_seconds / speaker_count.max(1)).max(1) as f32;
    let mut rng = rand::thread_rng();

    let samples = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let speaker = ((t / segment_seconds) as usize) % speaker_count.max(1);
            let pitch = 180.0 + speaker as f32 * 25.0;
            let speech_active = ((t * 0.5).sin().abs() > 0.25) as i32 as f32;
            let noise: f32 = rng.gen_range(-0.01..0.01);
            0.3 * (2.0 * std::f32::consts::PI * pitch * t).sin() * speech_active + noise
        })
        .collect();

    AudioTrack { samples, sample_rate }
}

fn benchmark_backend() -> ModelBackend {
    ModelBackend::external(
        Box::new(EnergyGateSegmentationModel {
            t_frames: 100,
            threshold: 0.05,
        }),
        Box::new(StatisticalEmbeddingModel),
    )
}

/// Pipeline throughput across increasing meeting lengths and speaker counts.
fn benchmark_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");
    group.sample_size(10);

    let scenarios = vec![
        ("2min_2speakers", meeting_audio(120, 2)),
        ("5min_3speakers", meeting_audio(300, 3)),
        ("15min_4speakers", meeting_audio(900, 4)),
    ];

    for (name, track) in scenarios {
        group.bench_with_input(BenchmarkId::new("process_recording", name), &track, |b, track| {
            b.iter(|| {
                let backend = benchmark_backend();
                let mut pipeline = DiarizationPipeline::new(DiarizationConfig::default(), &backend);
                black_box(pipeline.run(track).unwrap());
            });
        });
    }

    group.finish();
}

/// Registry throughput under an increasing number of distinct speakers.
fn benchmark_registry_scaling(c: &mut Criterion) {
    use diarbench::diarization::registry::SpeakerRegistry;
    use diarbench::diarization::types::Embedding;

    let mut group = c.benchmark_group("registry_scaling");

    let speaker_counts = vec![2usize, 10, 50, 100];

    for count in speaker_counts {
        group.bench_with_input(BenchmarkId::new("assign_or_create", count), &count, |b, &count| {
            b.iter(|| {
                let mut registry = SpeakerRegistry::new(&DiarizationConfig::default());
                for i in 0..count {
                    let angle = i as f32 * 0.3;
                    let embedding = Embedding::from_raw(vec![angle.cos(), angle.sin()], 1.0);
                    black_box(registry.assign_or_create(&embedding, i as f32));
                }
            });
        });
    }

    group.finish();
}

/// Chunk size sensitivity for the streaming pipeline.
fn benchmark_chunk_duration_sensitivity(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_duration_sensitivity");

    let chunk_durations = vec![2.0f32, 5.0, 10.0];
    let track = meeting_audio(60, 2);

    for chunk_duration in chunk_durations {
        group.bench_with_input(
            BenchmarkId::new("process_recording", format!("{chunk_duration}s_chunks")),
            &chunk_duration,
            |b, &chunk_duration| {
                b.iter(|| {
                    let backend = benchmark_backend();
                    let config = DiarizationConfig {
                        chunk_duration_seconds: chunk_duration,
                        ..Default::default()
                    };
                    let mut pipeline = DiarizationPipeline::new(config, &backend);
                    black_box(pipeline.run(&track).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_full_pipeline,
    benchmark_registry_scaling,
    benchmark_chunk_duration_sensitivity
);
criterion_main!(benches);
