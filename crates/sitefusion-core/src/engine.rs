//! Validation engine: per-candidate pipeline and verdict assembly.
//!
//! Each candidate walks a fixed state machine:
//!
//! `Pending -> Aggregating -> Corroborating -> Comparing -> Verdicted | Rejected`
//!
//! Aggregation failures on a mandatory category reject the candidate
//! with a machine-readable reason. Comparator and timeline enrichment
//! failures downgrade to warnings and never abort the pipeline. Both
//! terminal states are deterministic: re-running on unchanged input
//! reaches the same terminal state with the same numbers.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{aggregate, Aggregate};
use crate::checks::structural_warnings;
use crate::comparator::{compare_to_known_sites, ProfileRegistry, SiteComparison};
use crate::config::ValidationConfig;
use crate::corroborate::{is_corroborated, CorroborationPolicy};
use crate::evidence::SourceKind;
use crate::types::{Candidate, Category};
use crate::weights::WeightingPolicy;
use crate::FusionError;

/// Pipeline states for one candidate's validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    Pending,
    Aggregating,
    Corroborating,
    Comparing,
    Verdicted,
    Rejected,
}

/// Machine-readable reasons for a `Rejected` verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectionReason {
    /// A mandatory category had zero present weighted sources.
    MissingMandatoryEvidence { category: Category },
}

/// Warning codes attached to verdicts for non-fatal findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    /// An optional category had no present weighted sources.
    InsufficientCategoryEvidence,
    /// Comparator could not run: no features overlap any profile.
    ComparatorUnavailable,
    /// Indigenous timeline dates are malformed or out of order.
    InvalidTimeline,
    /// A configured artifact feature is absent.
    MissingRequiredField,
    /// Stratigraphic layer count outside configured bounds.
    LayerCountOutOfRange,
    /// Dating method not in the configured allow-list.
    DisallowedDatingMethod,
}

/// A non-fatal finding attached to a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
}

/// Fused result for one validation category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryOutcome {
    /// Composite confidence over present sources.
    pub composite: f64,

    /// Threshold the composite was held against.
    pub threshold: f64,

    /// Whether the candidate's evidence passed the corroboration gate
    /// (or the category accepts a single source).
    pub corroborated: bool,

    /// Category pass/fail: composite at or above threshold AND
    /// corroborated.
    pub confirmed: bool,

    /// Sources that contributed to the composite.
    pub contributing: BTreeSet<SourceKind>,

    /// Sources the category's weights wanted but the candidate lacked.
    pub missing: BTreeSet<SourceKind>,
}

/// Terminal pipeline state with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VerdictState {
    /// The candidate received a confidence judgment.
    Verdicted {
        /// Overall composite confidence (the "overall" category weights).
        confidence: f64,
        /// Whether the evidence cleared the corroboration gate.
        corroborated: bool,
    },
    /// The candidate could not be judged.
    Rejected { reason: RejectionReason },
}

/// The terminal, immutable outcome of validating one candidate.
///
/// Derived, never hand-edited; recomputed whenever input evidence
/// changes. `validated_at` is metadata; every other field is a pure
/// function of the candidate and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(flatten)]
    pub state: VerdictState,

    /// Per-category outcomes, for every category that aggregated.
    pub categories: BTreeMap<Category, CategoryOutcome>,

    /// Best known-site match, when the comparator could run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_site_comparison: Option<SiteComparison>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,

    pub validated_at: DateTime<Utc>,
}

impl Verdict {
    pub fn is_rejected(&self) -> bool {
        matches!(self.state, VerdictState::Rejected { .. })
    }

    /// Overall composite confidence, absent on rejection.
    pub fn confidence(&self) -> Option<f64> {
        match self.state {
            VerdictState::Verdicted { confidence, .. } => Some(confidence),
            VerdictState::Rejected { .. } => None,
        }
    }
}

/// The validation engine: shared, read-only policy plus the profile
/// registry, applied candidate by candidate.
///
/// Construct once before fanning out over candidates; `validate` takes
/// `&self` and holds no mutable state, so one engine serves any number
/// of worker threads.
pub struct ValidationEngine {
    config: ValidationConfig,
    weights: WeightingPolicy,
    corroboration: CorroborationPolicy,
    registry: ProfileRegistry,
}

impl ValidationEngine {
    /// Build the engine from configuration and a profile registry.
    ///
    /// This is where configuration that references an unknown category
    /// or source fails: fatal to the run, before any candidate is
    /// touched.
    pub fn new(config: ValidationConfig, registry: ProfileRegistry) -> Result<Self, FusionError> {
        let weights = WeightingPolicy::from_config(&config)?;
        let corroboration = config.corroboration_policy();
        Ok(Self {
            config,
            weights,
            corroboration,
            registry,
        })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Run one candidate through the full pipeline.
    pub fn validate(&self, candidate: &Candidate) -> Verdict {
        let mut state = ValidationState::Pending;
        let mut warnings = Vec::new();
        let mut categories = BTreeMap::new();

        // Pending -> Aggregating: fuse every category in fixed order.
        state = self.transition(state, ValidationState::Aggregating);
        let mut aggregates: BTreeMap<Category, Aggregate> = BTreeMap::new();
        for category in Category::ALL {
            match aggregate(&candidate.verification_scores, &self.weights, category) {
                Ok(agg) => {
                    aggregates.insert(category, agg);
                }
                // aggregate() only fails with InsufficientEvidence.
                Err(_) if self.config.is_mandatory(category) => {
                    self.transition(state, ValidationState::Rejected);
                    debug!(category = %category, "mandatory category has no evidence");
                    return Verdict {
                        state: VerdictState::Rejected {
                            reason: RejectionReason::MissingMandatoryEvidence { category },
                        },
                        categories,
                        known_site_comparison: None,
                        warnings,
                        validated_at: Utc::now(),
                    };
                }
                Err(_) => {
                    warnings.push(Warning {
                        code: WarningCode::InsufficientCategoryEvidence,
                        message: format!("no weighted evidence for category '{category}'"),
                    });
                }
            }
        }

        // Aggregating -> Corroborating: gate and per-category pass/fail.
        state = self.transition(state, ValidationState::Corroborating);
        let corroborated = is_corroborated(&candidate.verification_scores, &self.corroboration);
        for (category, agg) in aggregates {
            let threshold = self.config.confidence_thresholds.for_category(category);
            let category_corroborated =
                corroborated || self.config.is_single_source_acceptable(category);
            categories.insert(
                category,
                CategoryOutcome {
                    composite: agg.composite,
                    threshold,
                    corroborated: category_corroborated,
                    confirmed: agg.composite >= threshold && category_corroborated,
                    contributing: agg.contributing,
                    missing: agg.missing,
                },
            );
        }

        // Corroborating -> Comparing: supplementary enrichment; failures
        // downgrade to warnings.
        state = self.transition(state, ValidationState::Comparing);
        let known_site_comparison = match compare_to_known_sites(&candidate.features, &self.registry)
        {
            Ok(comparison) => Some(comparison),
            Err(err) => {
                warnings.push(Warning {
                    code: WarningCode::ComparatorUnavailable,
                    message: err.to_string(),
                });
                None
            }
        };

        if let Some(knowledge) = &candidate.indigenous_knowledge {
            if let Err(err) = knowledge.timeline.validate() {
                warnings.push(Warning {
                    code: WarningCode::InvalidTimeline,
                    message: err.to_string(),
                });
            }
        }

        warnings.extend(structural_warnings(candidate, &self.config));

        // Comparing -> Verdicted. A verdict needs an overall composite;
        // without one the candidate rejects even when the category was
        // configured as non-mandatory.
        let Some(overall) = categories.get(&Category::Overall) else {
            self.transition(state, ValidationState::Rejected);
            return Verdict {
                state: VerdictState::Rejected {
                    reason: RejectionReason::MissingMandatoryEvidence {
                        category: Category::Overall,
                    },
                },
                categories,
                known_site_comparison,
                warnings,
                validated_at: Utc::now(),
            };
        };
        let confidence = overall.composite;

        self.transition(state, ValidationState::Verdicted);
        Verdict {
            state: VerdictState::Verdicted {
                confidence,
                corroborated,
            },
            categories,
            known_site_comparison,
            warnings,
            validated_at: Utc::now(),
        }
    }

    fn transition(&self, from: ValidationState, to: ValidationState) -> ValidationState {
        debug!(?from, ?to, "validation state transition");
        to
    }
}
