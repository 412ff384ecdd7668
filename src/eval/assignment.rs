//! Assignment solver: batch Hungarian mapping and streaming first-occurrence
//! mapping (spec §4.7).
//!
//! No crate in the surrounding stack implements a min-cost bipartite
//! assignment solver, so the Hungarian algorithm below is hand-written — the
//! classic O(n^3) primal-dual ("shortest augmenting path with potentials")
//! formulation, kept in `i64` cost units since the overlap matrix is built
//! from integer frame counts.

use crate::diarization::types::TimedSpeakerSegment;
use crate::eval::metrics::{active_speaker_sets, FRAME_SECONDS};
use std::collections::{HashMap, HashSet};

/// Rasterizes `segments` into a single-label-per-frame track: for frames
/// where more than one speaker is active, the lexicographically first
/// speaker id wins (§4.7 step 1's documented ambiguity).
fn rasterize_single_label(segments: &[TimedSpeakerSegment], total_frames: u64) -> Vec<Option<String>> {
    active_speaker_sets(segments, total_frames)
        .into_iter()
        .map(|mut set| {
            set.sort();
            set.into_iter().next()
        })
        .collect()
}

/// Builds the overlap count matrix `M[p_i, r_j]` (§4.7 step 2) and the
/// predicted/reference id orderings that index it.
fn overlap_matrix(
    predicted: &[TimedSpeakerSegment],
    reference: &[TimedSpeakerSegment],
    total_duration_seconds: f32,
) -> (Vec<String>, Vec<String>, Vec<Vec<i64>>) {
    let total_frames = (total_duration_seconds / FRAME_SECONDS).floor() as u64;

    let mut predicted_ids: Vec<String> = predicted.iter().map(|s| s.speaker_id.clone()).collect();
    predicted_ids.sort();
    predicted_ids.dedup();

    let mut reference_ids: Vec<String> = reference.iter().map(|s| s.speaker_id.clone()).collect();
    reference_ids.sort();
    reference_ids.dedup();

    let predicted_track = rasterize_single_label(predicted, total_frames);
    let reference_track = rasterize_single_label(reference, total_frames);

    let mut matrix = vec![vec![0i64; reference_ids.len()]; predicted_ids.len()];
    for (p, g) in predicted_track.iter().zip(reference_track.iter()) {
        if let (Some(p), Some(g)) = (p, g) {
            let i = predicted_ids.iter().position(|id| id == p).unwrap();
            let j = reference_ids.iter().position(|id| id == g).unwrap();
            matrix[i][j] += 1;
        }
    }

    (predicted_ids, reference_ids, matrix)
}

/// Batch / offline mapping (§4.7): solves a minimum-cost assignment on the
/// padded, negated overlap matrix and drops zero-overlap pairs.
pub fn hungarian_mapping(
    predicted: &[TimedSpeakerSegment],
    reference: &[TimedSpeakerSegment],
    total_duration_seconds: f32,
) -> HashMap<String, String> {
    let (predicted_ids, reference_ids, matrix) = overlap_matrix(predicted, reference, total_duration_seconds);

    if predicted_ids.is_empty() || reference_ids.is_empty() {
        return HashMap::new();
    }

    let n = predicted_ids.len().max(reference_ids.len());
    let max_overlap = matrix.iter().flatten().copied().max().unwrap_or(0);

    let mut cost = vec![vec![max_overlap; n]; n];
    for (i, row) in matrix.iter().enumerate() {
        for (j, &overlap) in row.iter().enumerate() {
            cost[i][j] = max_overlap - overlap;
        }
    }

    let assignment = solve_hungarian(&cost);

    let mut mapping = HashMap::new();
    for (i, &j) in assignment.iter().enumerate() {
        if i >= predicted_ids.len() || j >= reference_ids.len() {
            continue;
        }
        if matrix[i][j] == 0 {
            continue;
        }
        mapping.insert(predicted_ids[i].clone(), reference_ids[j].clone());
    }

    mapping
}

/// Solves a square minimum-cost assignment problem via the Kuhn-Munkres
/// primal-dual algorithm. Returns `assignment[row] = column`.
fn solve_hungarian(cost: &[Vec<i64>]) -> Vec<usize> {
    let n = cost.len();
    if n == 0 {
        return Vec::new();
    }

    const INF: i64 = i64::MAX / 4;

    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; n + 1];
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![INF; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = INF;
            let mut j1 = 0usize;

            for j in 1..=n {
                if !used[j] {
                    let cur = cost[i0 - 1][j - 1] - u[i0] - v[j];
                    if cur < minv[j] {
                        minv[j] = cur;
                        way[j] = j0;
                    }
                    if minv[j] < delta {
                        delta = minv[j];
                        j1 = j;
                    }
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=n {
        assignment[p[j] - 1] = j - 1;
    }
    assignment
}

/// Streaming first-occurrence mapping (§4.7): assigns each predicted speaker
/// id, in the chronological order it is first observed, to the reference id
/// with maximum total overlap (in seconds) not yet claimed, provided that
/// overlap is at least 0.5 s.
pub fn first_occurrence_mapping(
    predicted: &[TimedSpeakerSegment],
    reference: &[TimedSpeakerSegment],
) -> HashMap<String, String> {
    const MIN_OVERLAP_SECONDS: f32 = 0.5;

    let mut sorted_predicted = predicted.to_vec();
    sorted_predicted.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

    let mut first_occurrence_order = Vec::new();
    let mut seen = HashSet::new();
    for segment in &sorted_predicted {
        if seen.insert(segment.speaker_id.clone()) {
            first_occurrence_order.push(segment.speaker_id.clone());
        }
    }

    let mut claimed = HashSet::new();
    let mut mapping = HashMap::new();

    for predicted_id in first_occurrence_order {
        let mut best_id: Option<String> = None;
        let mut best_overlap = 0.0f32;

        let mut reference_ids: Vec<&String> = reference.iter().map(|s| &s.speaker_id).collect();
        reference_ids.sort();
        reference_ids.dedup();

        for reference_id in reference_ids {
            if claimed.contains(reference_id) {
                continue;
            }
            let overlap = total_overlap_seconds(&predicted_id, reference_id, predicted, reference);
            if overlap > best_overlap || (overlap == best_overlap && best_id.is_none()) {
                if overlap >= MIN_OVERLAP_SECONDS {
                    best_overlap = overlap;
                    best_id = Some(reference_id.clone());
                }
            }
        }

        if let Some(reference_id) = best_id {
            claimed.insert(reference_id.clone());
            mapping.insert(predicted_id, reference_id);
        }
    }

    mapping
}

fn total_overlap_seconds(
    predicted_id: &str,
    reference_id: &str,
    predicted: &[TimedSpeakerSegment],
    reference: &[TimedSpeakerSegment],
) -> f32 {
    let mut total = 0.0;
    for p in predicted.iter().filter(|s| s.speaker_id == predicted_id) {
        for r in reference.iter().filter(|s| s.speaker_id == reference_id) {
            let start = p.start_seconds.max(r.start_seconds);
            let end = p.end_seconds.min(r.end_seconds);
            if end > start {
                total += end - start;
            }
        }
    }
    total
}
