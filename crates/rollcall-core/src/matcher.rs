//! Roster matching by minimum embedding distance.

use crate::types::Embedding;

/// One enrolled identity, as loaded for a recognition session.
#[derive(Debug, Clone)]
pub struct KnownFace {
    pub roll_no: i64,
    pub name: String,
    pub embedding: Embedding,
}

/// Result of matching a probe embedding against the roster.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Match {
        roll_no: i64,
        name: String,
        distance: f32,
    },
    Unknown,
}

/// Strategy for assigning an identity to a probe embedding.
pub trait Matcher {
    fn best_match(&self, probe: &Embedding, roster: &[KnownFace]) -> MatchOutcome;
}

/// Nearest-neighbor matcher with an absolute distance cutoff.
///
/// The cutoff is absolute, not a best-vs-runner-up margin test: two
/// enrolled identities closer together than the tolerance can shadow
/// each other. That is an accepted tradeoff for O(roster) matching with
/// a single stored vector per identity.
pub struct NearestMatcher {
    pub tolerance: f32,
}

impl NearestMatcher {
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }
}

impl Matcher for NearestMatcher {
    fn best_match(&self, probe: &Embedding, roster: &[KnownFace]) -> MatchOutcome {
        // Empty roster: nothing to compare against, skip the scan entirely.
        if roster.is_empty() {
            return MatchOutcome::Unknown;
        }

        let mut best_idx = 0usize;
        let mut best_dist = f32::INFINITY;
        for (i, known) in roster.iter().enumerate() {
            let dist = probe.distance(&known.embedding);
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
            }
        }

        if best_dist <= self.tolerance {
            let hit = &roster[best_idx];
            MatchOutcome::Match {
                roll_no: hit.roll_no,
                name: hit.name.clone(),
                distance: best_dist,
            }
        } else {
            MatchOutcome::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(roll_no: i64, name: &str, values: Vec<f32>) -> KnownFace {
        KnownFace {
            roll_no,
            name: name.to_string(),
            embedding: Embedding::new(values),
        }
    }

    #[test]
    fn query_within_tolerance_matches_nearest() {
        // A at the origin, B at distance 1.0 from A.
        let roster = vec![
            known(1, "a", vec![0.0, 0.0]),
            known(2, "b", vec![1.0, 0.0]),
        ];
        let matcher = NearestMatcher::new(0.6);

        // 0.3 away from A, 0.7 away from B.
        let probe = Embedding::new(vec![0.3, 0.0]);
        match matcher.best_match(&probe, &roster) {
            MatchOutcome::Match {
                roll_no, distance, ..
            } => {
                assert_eq!(roll_no, 1);
                assert!((distance - 0.3).abs() < 1e-6);
            }
            MatchOutcome::Unknown => panic!("expected a match"),
        }
    }

    #[test]
    fn query_beyond_tolerance_is_unknown() {
        let roster = vec![
            known(1, "a", vec![0.0, 0.0]),
            known(2, "b", vec![1.0, 0.0]),
        ];
        let matcher = NearestMatcher::new(0.6);

        // 0.9 away from both A and B (above the point (0.5, y)).
        let y = (0.9f32 * 0.9 - 0.25).sqrt();
        let probe = Embedding::new(vec![0.5, y]);
        assert_eq!(matcher.best_match(&probe, &roster), MatchOutcome::Unknown);
    }

    #[test]
    fn distance_exactly_at_tolerance_matches() {
        let roster = vec![known(7, "edge", vec![0.0, 0.0])];
        let matcher = NearestMatcher::new(0.6);
        let probe = Embedding::new(vec![0.6, 0.0]);
        assert!(matches!(
            matcher.best_match(&probe, &roster),
            MatchOutcome::Match { roll_no: 7, .. }
        ));
    }

    #[test]
    fn empty_roster_is_always_unknown() {
        let matcher = NearestMatcher::new(0.6);
        let probe = Embedding::new(vec![0.0, 0.0]);
        assert_eq!(matcher.best_match(&probe, &[]), MatchOutcome::Unknown);
    }

    #[test]
    fn nearest_of_several_wins() {
        let roster = vec![
            known(1, "far", vec![5.0, 0.0]),
            known(2, "near", vec![0.1, 0.0]),
            known(3, "mid", vec![0.5, 0.0]),
        ];
        let matcher = NearestMatcher::new(0.6);
        let probe = Embedding::new(vec![0.0, 0.0]);
        assert!(matches!(
            matcher.best_match(&probe, &roster),
            MatchOutcome::Match { roll_no: 2, .. }
        ));
    }
}
