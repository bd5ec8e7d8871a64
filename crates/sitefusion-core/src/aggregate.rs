//! Score Aggregator: weighted fusion of present evidence sources.
//!
//! Composite confidence for a category is the weighted mean over the
//! sources that are actually present: the denominator re-normalizes to
//! present weight, so a candidate with two of five sources is judged
//! purely on those two. Coverage guarantees are the corroboration
//! gate's job, not this module's.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::evidence::{EvidenceScores, SourceKind};
use crate::types::Category;
use crate::weights::WeightingPolicy;
use crate::FusionError;

/// Result of aggregating one category's evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Weighted mean of present source scores, in [0, 1].
    pub composite: f64,

    /// Sources that contributed to the composite.
    pub contributing: BTreeSet<SourceKind>,

    /// Sources the policy wanted but the candidate lacked.
    pub missing: BTreeSet<SourceKind>,
}

/// Fuse the present evidence scores under a category's weights.
///
/// Pure and order-independent: the same scores and policy always yield
/// the same composite. Fails with [`FusionError::InsufficientEvidence`]
/// when no weighted source is present, the one legitimate way to
/// withhold a score, never silently reported as 0.
pub fn aggregate(
    scores: &EvidenceScores,
    policy: &WeightingPolicy,
    category: Category,
) -> Result<Aggregate, FusionError> {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut contributing = BTreeSet::new();
    let mut missing = BTreeSet::new();

    for &(kind, weight) in policy.for_category(category) {
        match scores.get(kind) {
            Some(score) => {
                numerator += weight * score;
                denominator += weight;
                contributing.insert(kind);
            }
            None => {
                missing.insert(kind);
            }
        }
    }

    if denominator <= 0.0 {
        return Err(FusionError::InsufficientEvidence { category });
    }

    // Guard against float drift at the boundaries.
    let composite = (numerator / denominator).clamp(0.0, 1.0);

    Ok(Aggregate {
        composite,
        contributing,
        missing,
    })
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_scores() -> impl Strategy<Value = EvidenceScores> {
        proptest::collection::btree_map(
            prop_oneof![
                Just(SourceKind::Lidar),
                Just(SourceKind::Satellite),
                Just(SourceKind::Historical),
                Just(SourceKind::Indigenous),
                Just(SourceKind::Temporal),
            ],
            0.0..=1.0f64,
            0..=5,
        )
        .prop_map(|map| EvidenceScores::try_from(map).unwrap())
    }

    proptest! {
        #[test]
        fn composite_always_in_unit_interval(scores in arb_scores()) {
            let policy = WeightingPolicy::defaults();
            for category in Category::ALL {
                if let Ok(agg) = aggregate(&scores, &policy, category) {
                    prop_assert!((0.0..=1.0).contains(&agg.composite));
                }
            }
        }

        #[test]
        fn errs_exactly_when_no_weighted_source_present(scores in arb_scores()) {
            let policy = WeightingPolicy::defaults();
            let result = aggregate(&scores, &policy, Category::Overall);
            prop_assert_eq!(result.is_err(), scores.is_empty());
        }

        #[test]
        fn equal_weights_match_arithmetic_mean(scores in arb_scores()) {
            let policy = WeightingPolicy::defaults();
            if scores.is_empty() {
                return Ok(());
            }
            let mean: f64 = scores.iter().map(|(_, s)| s).sum::<f64>()
                / scores.present_count() as f64;
            let agg = aggregate(&scores, &policy, Category::Overall).unwrap();
            prop_assert!((agg.composite - mean).abs() < 1e-9);
        }
    }
}
