//! Cross-validation gate: independent corroboration of a candidate.
//!
//! "Independently verified" has a formal meaning: at least
//! `min_independent_sources` sources must each individually clear a
//! per-source threshold. One very confident source never qualifies,
//! regardless of its score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evidence::{EvidenceScores, SourceKind};

/// Threshold policy for the corroboration gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorroborationPolicy {
    /// Minimum number of qualifying sources.
    pub min_independent_sources: usize,

    /// Threshold applied to any source without a per-kind override.
    pub default_threshold: f64,

    /// Per-source threshold overrides.
    #[serde(default)]
    pub per_source: BTreeMap<SourceKind, f64>,
}

impl Default for CorroborationPolicy {
    fn default() -> Self {
        Self {
            min_independent_sources: 2,
            default_threshold: 0.7,
            per_source: BTreeMap::new(),
        }
    }
}

impl CorroborationPolicy {
    /// The threshold a given source must clear.
    pub fn threshold_for(&self, kind: SourceKind) -> f64 {
        self.per_source
            .get(&kind)
            .copied()
            .unwrap_or(self.default_threshold)
    }
}

/// Whether the candidate's evidence is independently corroborated.
///
/// Counts present sources whose score is at or above their threshold.
/// Fewer present sources than the minimum is `false`, not an error:
/// for this gate, absence of evidence is evidence of non-corroboration.
pub fn is_corroborated(scores: &EvidenceScores, policy: &CorroborationPolicy) -> bool {
    if scores.present_count() < policy.min_independent_sources {
        return false;
    }

    let qualifying = scores
        .iter()
        .filter(|&(kind, score)| score >= policy.threshold_for(kind))
        .count();

    qualifying >= policy.min_independent_sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(SourceKind, f64)]) -> EvidenceScores {
        let mut s = EvidenceScores::new();
        for &(kind, score) in pairs {
            s.set(kind, score).unwrap();
        }
        s
    }

    #[test]
    fn test_single_high_source_is_not_corroboration() {
        let policy = CorroborationPolicy::default();
        let scores = scores(&[(SourceKind::Lidar, 1.0)]);
        assert!(!is_corroborated(&scores, &policy));
    }

    #[test]
    fn test_exactly_minimum_sources_exactly_at_threshold() {
        let policy = CorroborationPolicy::default();
        let scores = scores(&[(SourceKind::Lidar, 0.7), (SourceKind::Satellite, 0.7)]);
        assert!(is_corroborated(&scores, &policy));
    }

    #[test]
    fn test_one_source_below_threshold_fails_the_pair() {
        let policy = CorroborationPolicy::default();
        let scores = scores(&[(SourceKind::Lidar, 0.95), (SourceKind::Satellite, 0.69)]);
        assert!(!is_corroborated(&scores, &policy));
    }

    #[test]
    fn test_no_sources_present_is_false_not_error() {
        let policy = CorroborationPolicy::default();
        assert!(!is_corroborated(&EvidenceScores::new(), &policy));
    }

    #[test]
    fn test_per_source_override() {
        let mut policy = CorroborationPolicy::default();
        policy.per_source.insert(SourceKind::Historical, 0.5);

        let scores = scores(&[(SourceKind::Historical, 0.55), (SourceKind::Lidar, 0.8)]);
        assert!(is_corroborated(&scores, &policy));

        policy.per_source.insert(SourceKind::Historical, 0.6);
        assert!(!is_corroborated(&scores, &policy));
    }

    #[test]
    fn test_five_strong_sources() {
        let policy = CorroborationPolicy::default();
        let scores = scores(&[
            (SourceKind::Lidar, 0.9),
            (SourceKind::Satellite, 0.8),
            (SourceKind::Historical, 0.75),
            (SourceKind::Indigenous, 0.85),
            (SourceKind::Temporal, 0.8),
        ]);
        assert!(is_corroborated(&scores, &policy));
    }
}
