//! Speaker registry: online identity assignment (spec §4.2).
//!
//! Adapted from the teacher's `SpeakerClusterer::online_cluster_embedding`,
//! which compared a new embedding against existing speakers' average
//! similarity and assigned to the best match above a threshold or created a
//! new speaker. This generalizes that single-threshold rule into the
//! assignment/update two-threshold scheme and the explicit no-retroactive-
//! relabelling contract.

use crate::config::DiarizationConfig;
use crate::diarization::embedding_algebra::{cosine_distance, normalize, validate, weighted_blend};
use crate::diarization::types::{Embedding, SpeakerPrototype, UNVOICED_SPEAKER_ID};
use tracing::{debug, warn};
use uuid::Uuid;

/// The growing dictionary of speaker prototype embeddings for one recording.
///
/// Prototypes are never retired or merged once created; the registry only
/// ever grows, matching the pipeline's online-commitment contract (§4.2).
pub struct SpeakerRegistry {
    prototypes: Vec<SpeakerPrototype>,
    assignment_threshold: f32,
    update_threshold: f32,
    update_weight: f32,
    max_speakers: Option<usize>,
}

impl SpeakerRegistry {
    pub fn new(config: &DiarizationConfig) -> Self {
        Self {
            prototypes: Vec::new(),
            assignment_threshold: config.effective_assignment_threshold(),
            update_threshold: config.update_threshold,
            update_weight: config.update_weight,
            max_speakers: config.max_speakers,
        }
    }

    pub fn prototypes(&self) -> &[SpeakerPrototype] {
        &self.prototypes
    }

    /// Assigns `embedding` observed at `time_seconds` to a speaker id,
    /// creating or updating prototypes as needed (§4.2's `assignOrCreate`).
    ///
    /// Returns [`UNVOICED_SPEAKER_ID`] without mutating state if the
    /// embedding is invalid.
    pub fn assign_or_create(&mut self, embedding: &Embedding, time_seconds: f32) -> String {
        if !validate(&embedding.vector) {
            warn!(time_seconds, "discarding invalid embedding");
            return UNVOICED_SPEAKER_ID.to_string();
        }

        if self.prototypes.is_empty() {
            return self.create_prototype(embedding, time_seconds);
        }

        let (best_index, best_distance) = self
            .prototypes
            .iter()
            .enumerate()
            .map(|(i, p)| (i, cosine_distance(&embedding.vector, &p.prototype)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .expect("prototypes is non-empty");

        if best_distance <= self.update_threshold {
            let prototype = &mut self.prototypes[best_index];
            prototype.prototype = weighted_blend(&prototype.prototype, &embedding.vector, self.update_weight);
            prototype.observation_count += 1;
            debug!(id = %prototype.id, best_distance, "updated prototype");
            prototype.id.clone()
        } else if best_distance <= self.assignment_threshold {
            let prototype = &mut self.prototypes[best_index];
            prototype.observation_count += 1;
            debug!(id = %prototype.id, best_distance, "assigned without update");
            prototype.id.clone()
        } else if self.max_speakers.map_or(true, |cap| self.prototypes.len() < cap) {
            self.create_prototype(embedding, time_seconds)
        } else {
            let prototype = &mut self.prototypes[best_index];
            prototype.observation_count += 1;
            warn!(id = %prototype.id, best_distance, "speaker cap reached, force-assigning");
            prototype.id.clone()
        }
    }

    fn create_prototype(&mut self, embedding: &Embedding, time_seconds: f32) -> String {
        let id = Uuid::new_v4().to_string();
        self.prototypes.push(SpeakerPrototype {
            id: id.clone(),
            prototype: normalize(&embedding.vector),
            creation_time_seconds: time_seconds,
            observation_count: 1,
        });
        debug!(id = %id, time_seconds, "created new speaker prototype");
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(vector: Vec<f32>) -> Embedding {
        Embedding::from_raw(vector, 1.0)
    }

    #[test]
    fn first_embedding_creates_prototype() {
        let mut registry = SpeakerRegistry::new(&DiarizationConfig::default());
        let id = registry.assign_or_create(&embedding(vec![1.0, 0.0]), 0.0);
        assert_eq!(registry.prototypes().len(), 1);
        assert_eq!(registry.prototypes()[0].id, id);
    }

    #[test]
    fn similar_embedding_reuses_same_speaker() {
        let mut registry = SpeakerRegistry::new(&DiarizationConfig::default());
        let first = registry.assign_or_create(&embedding(vec![1.0, 0.01]), 0.0);
        let second = registry.assign_or_create(&embedding(vec![1.0, 0.02]), 1.0);
        assert_eq!(first, second);
        assert_eq!(registry.prototypes().len(), 1);
    }

    #[test]
    fn dissimilar_embedding_creates_new_speaker() {
        let mut registry = SpeakerRegistry::new(&DiarizationConfig::default());
        let first = registry.assign_or_create(&embedding(vec![1.0, 0.0]), 0.0);
        let second = registry.assign_or_create(&embedding(vec![0.0, 1.0]), 1.0);
        assert_ne!(first, second);
        assert_eq!(registry.prototypes().len(), 2);
    }

    #[test]
    fn invalid_embedding_returns_sentinel_without_mutation() {
        let mut registry = SpeakerRegistry::new(&DiarizationConfig::default());
        let id = registry.assign_or_create(&embedding(vec![0.0, 0.0]), 0.0);
        assert_eq!(id, UNVOICED_SPEAKER_ID);
        assert!(registry.prototypes().is_empty());
    }

    #[test]
    fn max_speakers_cap_forces_assignment_instead_of_creation() {
        let config = DiarizationConfig {
            max_speakers: Some(1),
            ..Default::default()
        };
        let mut registry = SpeakerRegistry::new(&config);
        let first = registry.assign_or_create(&embedding(vec![1.0, 0.0]), 0.0);
        let second = registry.assign_or_create(&embedding(vec![0.0, 1.0]), 1.0);
        assert_eq!(first, second);
        assert_eq!(registry.prototypes().len(), 1);
    }
}
