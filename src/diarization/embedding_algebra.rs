//! Embedding algebra (spec §4.1).
//!
//! Grounded on the teacher's `SpeakerEmbedding::similarity` cosine-similarity
//! method, generalized into the small set of free functions the registry and
//! embedding extractor build on: normalization, distance, blending, quality,
//! and validity.

const EPSILON: f32 = 1e-6;

/// `v / ‖v‖₂`. Returns the zero vector if `‖v‖₂ < ε`.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = magnitude(v);
    if norm < EPSILON {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / norm).collect()
}

fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// `1 − (a·b) / (‖a‖·‖b‖)`. Returns `+∞` if either magnitude is below ε.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    if mag_a < EPSILON || mag_b < EPSILON {
        return f32::INFINITY;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    1.0 - dot / (mag_a * mag_b)
}

/// `normalize((1−α)·p + α·e)`.
pub fn weighted_blend(prototype: &[f32], embedding: &[f32], alpha: f32) -> Vec<f32> {
    let blended: Vec<f32> = prototype
        .iter()
        .zip(embedding.iter())
        .map(|(p, e)| (1.0 - alpha) * p + alpha * e)
        .collect();
    normalize(&blended)
}

/// Monotone function of `‖v‖` pre-normalization, clipped to `[0, 1]`.
///
/// Used to bias which region's embedding is preferred when several regions
/// overlap: a well-formed embedding model tends to produce larger-magnitude
/// raw vectors for cleaner, less noisy audio spans.
pub fn quality(raw: &[f32]) -> f32 {
    let norm = magnitude(raw);
    (norm / (norm + 1.0)).clamp(0.0, 1.0)
}

/// True iff all components are finite and `‖v‖ > 0.1`.
pub fn validate(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite()) && magnitude(v) > 0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unit_vector_is_identity() {
        let v = normalize(&[1.0, 0.0, 0.0]);
        assert_eq!(v, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn normalize_near_zero_vector_returns_zero() {
        let v = normalize(&[1e-8, 1e-8]);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn cosine_distance_identical_vectors_is_zero() {
        let d = cosine_distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!(d.abs() < 1e-5);
    }

    #[test]
    fn cosine_distance_orthogonal_vectors_is_one() {
        let d = cosine_distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((d - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_distance_degenerate_vector_is_infinite() {
        let d = cosine_distance(&[0.0, 0.0], &[1.0, 0.0]);
        assert!(d.is_infinite());
    }

    #[test]
    fn weighted_blend_is_unit_length() {
        let b = weighted_blend(&[1.0, 0.0], &[0.0, 1.0], 0.5);
        let norm: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn weighted_blend_alpha_zero_keeps_prototype_direction() {
        let prototype = normalize(&[1.0, 0.0]);
        let blended = weighted_blend(&prototype, &[0.0, 1.0], 0.0);
        assert!((blended[0] - prototype[0]).abs() < 1e-5);
    }

    #[test]
    fn validate_rejects_non_finite_and_near_zero() {
        assert!(!validate(&[f32::NAN, 1.0]));
        assert!(!validate(&[0.01, 0.01]));
        assert!(validate(&[1.0, 1.0]));
    }

    #[test]
    fn quality_is_bounded() {
        assert!(quality(&[1000.0, 1000.0]) <= 1.0);
        assert!(quality(&[0.0, 0.0]) >= 0.0);
    }
}
