//! Enrollment sample handling: frame classification and embedding
//! averaging.
//!
//! Enrollment collects many noisy embeddings of one person and stores a
//! single averaged vector. Averaging trades per-sample matching accuracy
//! for O(1) comparison cost per enrolled identity.

use crate::types::Embedding;
use serde::{Deserialize, Serialize};

/// Whether the most recent enrollment frame was usable as a sample.
///
/// Only frames containing exactly one face are accepted; the other two
/// states exist so a consumer can tell the subject what to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleState {
    Accepted,
    NoFace,
    MultipleFaces,
}

/// Progress of an enrollment run, published after every processed frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum EnrollProgress {
    Collecting {
        state: SampleState,
        accepted: usize,
        target: usize,
    },
    Extracting {
        done: usize,
        total: usize,
    },
}

/// Classify an enrollment frame by how many faces were detected in it.
pub fn classify_sample(face_count: usize) -> SampleState {
    match face_count {
        0 => SampleState::NoFace,
        1 => SampleState::Accepted,
        _ => SampleState::MultipleFaces,
    }
}

/// Component-wise mean of the collected embeddings.
///
/// Returns `None` for an empty slice or when the samples disagree on
/// dimension (a model-mismatch symptom, never a valid identity).
pub fn average_embeddings(samples: &[Embedding]) -> Option<Embedding> {
    let dim = samples.first()?.dim();
    if samples.iter().any(|e| e.dim() != dim) {
        return None;
    }

    let mut sums = vec![0.0f64; dim];
    for sample in samples {
        for (sum, value) in sums.iter_mut().zip(sample.values.iter()) {
            *sum += f64::from(*value);
        }
    }

    let count = samples.len() as f64;
    Some(Embedding::new(
        sums.into_iter().map(|s| (s / count) as f32).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_three_samples() {
        let samples = vec![
            Embedding::new(vec![0.0, 0.0]),
            Embedding::new(vec![2.0, 0.0]),
            Embedding::new(vec![1.0, 0.0]),
        ];
        let mean = average_embeddings(&samples).expect("non-empty input");
        assert_eq!(mean.values, vec![1.0, 0.0]);
    }

    #[test]
    fn average_of_single_sample_is_identity() {
        let samples = vec![Embedding::new(vec![0.25, -0.75, 3.0])];
        let mean = average_embeddings(&samples).expect("non-empty input");
        assert_eq!(mean.values, vec![0.25, -0.75, 3.0]);
    }

    #[test]
    fn average_of_nothing_is_none() {
        assert_eq!(average_embeddings(&[]), None);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let samples = vec![
            Embedding::new(vec![1.0, 2.0]),
            Embedding::new(vec![1.0, 2.0, 3.0]),
        ];
        assert_eq!(average_embeddings(&samples), None);
    }

    #[test]
    fn classification_by_face_count() {
        assert_eq!(classify_sample(0), SampleState::NoFace);
        assert_eq!(classify_sample(1), SampleState::Accepted);
        assert_eq!(classify_sample(2), SampleState::MultipleFaces);
        assert_eq!(classify_sample(9), SampleState::MultipleFaces);
    }
}
