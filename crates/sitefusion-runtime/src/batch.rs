//! Batch validator: rayon fan-out over candidates.
//!
//! Shared policy state (weight tables, thresholds, profile registry) is
//! built once, before the pool starts, and only read afterwards, so no
//! locking. A rejected candidate never stops the batch; a configuration
//! error does, since it indicates systemic misconfiguration rather than
//! a per-candidate data issue.

use std::num::NonZeroU32;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use sitefusion_core::{
    bucketize, period_overlap, Candidate, FusionError, ProfileRegistry, ValidationConfig,
    ValidationEngine,
};

use crate::report::{BatchReport, BatchSummary, CandidateOutcome};

/// Default development-curve bin width, in years.
pub const DEFAULT_BIN_WIDTH_YEARS: u32 = 100;

/// Errors from batch validation.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Policy construction failed; aborts the whole run.
    #[error("Configuration error: {0}")]
    Config(#[from] FusionError),

    #[error("Invalid bin width: must be at least one year")]
    InvalidBinWidth,
}

/// Validates batches of candidates against one immutable configuration.
pub struct BatchValidator {
    engine: ValidationEngine,
    bin_width_years: NonZeroU32,
}

impl BatchValidator {
    /// Build the shared engine state. Configuration that references an
    /// unknown category or source fails here, before any candidate is
    /// processed.
    pub fn new(config: ValidationConfig, registry: ProfileRegistry) -> Result<Self, BatchError> {
        let engine = ValidationEngine::new(config, registry)?;
        let bin_width_years =
            NonZeroU32::new(DEFAULT_BIN_WIDTH_YEARS).ok_or(BatchError::InvalidBinWidth)?;
        Ok(Self {
            engine,
            bin_width_years,
        })
    }

    /// Override the development-curve bin width.
    pub fn with_bin_width(mut self, years: u32) -> Result<Self, BatchError> {
        self.bin_width_years = NonZeroU32::new(years).ok_or(BatchError::InvalidBinWidth)?;
        Ok(self)
    }

    /// Validate every candidate and assemble the batch report.
    ///
    /// Outcomes are returned in input order regardless of worker
    /// scheduling. Per-candidate rejection is report content, never a
    /// batch failure.
    pub fn validate_batch(&self, candidates: &[Candidate]) -> BatchReport {
        info!(count = candidates.len(), "starting batch validation");

        let results: Vec<CandidateOutcome> = candidates
            .par_iter()
            .enumerate()
            .map(|(index, candidate)| {
                let verdict = self.engine.validate(candidate);
                debug!(
                    index,
                    rejected = verdict.is_rejected(),
                    warnings = verdict.warnings.len(),
                    "candidate validated"
                );

                // Additive enrichment only: the candidate's evidence is
                // never touched.
                let mut enriched = candidate.clone();
                if enriched.known_site_comparison.is_none() {
                    enriched.known_site_comparison = verdict.known_site_comparison.clone();
                }

                CandidateOutcome {
                    index,
                    candidate: enriched,
                    verdict,
                }
            })
            .collect();

        let summary = BatchSummary {
            verdicted: results.iter().filter(|o| !o.verdict.is_rejected()).count(),
            rejected: results.iter().filter(|o| o.verdict.is_rejected()).count(),
            with_warnings: results
                .iter()
                .filter(|o| !o.verdict.warnings.is_empty())
                .count(),
        };

        let temporal_development = bucketize(candidates, self.bin_width_years);
        let overlap = period_overlap(candidates);

        info!(
            verdicted = summary.verdicted,
            rejected = summary.rejected,
            "batch validation complete"
        );

        BatchReport {
            results,
            summary,
            temporal_development,
            period_overlap: overlap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitefusion_core::VerdictState;

    fn config() -> ValidationConfig {
        ValidationConfig::from_yaml(
            r#"
confidence_thresholds:
  boundary: 0.7
  artifact: 0.6
  stratigraphy: 0.6
  dating: 0.6
  overall: 0.7
"#,
        )
        .unwrap()
    }

    fn candidate_json(scores: &str) -> Candidate {
        serde_json::from_str(&format!(
            r#"{{
                "type": "settlement",
                "coordinates": {{"x": -54.0, "y": -13.0, "elevation": 250.0}},
                "features": {{"mound_height": 2.0}},
                "area": 20000.0,
                "verification_scores": {scores}
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_rejected_candidate_does_not_stop_batch() {
        let validator =
            BatchValidator::new(config(), ProfileRegistry::amazon_defaults().clone()).unwrap();

        let candidates = vec![
            candidate_json(r#"{"lidar": 0.9, "satellite": 0.8}"#),
            candidate_json(r#"{}"#),
            candidate_json(r#"{"historical": 0.75, "indigenous": 0.8}"#),
        ];

        let report = validator.validate_batch(&candidates);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.summary.verdicted, 2);
        assert_eq!(report.summary.rejected, 1);
        assert!(matches!(
            report.results[1].verdict.state,
            VerdictState::Rejected { .. }
        ));
    }

    #[test]
    fn test_outcomes_preserve_input_order() {
        let validator =
            BatchValidator::new(config(), ProfileRegistry::amazon_defaults().clone()).unwrap();

        let candidates: Vec<Candidate> = (0..32)
            .map(|_| candidate_json(r#"{"lidar": 0.9, "satellite": 0.8}"#))
            .collect();

        let report = validator.validate_batch(&candidates);
        let indices: Vec<usize> = report.results.iter().map(|o| o.index).collect();
        assert_eq!(indices, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_category_aborts_before_pool() {
        let config = ValidationConfig::from_yaml(
            r#"
confidence_thresholds:
  boundary: 0.7
  artifact: 0.6
  stratigraphy: 0.6
  dating: 0.6
  overall: 0.7
category_weights:
  geophysics:
    lidar: 1.0
"#,
        )
        .unwrap();

        let result = BatchValidator::new(config, ProfileRegistry::amazon_defaults().clone());
        assert!(matches!(result, Err(BatchError::Config(_))));
    }

    #[test]
    fn test_zero_bin_width_rejected() {
        let validator =
            BatchValidator::new(config(), ProfileRegistry::amazon_defaults().clone()).unwrap();
        assert!(matches!(
            validator.with_bin_width(0),
            Err(BatchError::InvalidBinWidth)
        ));
    }

    #[test]
    fn test_report_includes_temporal_aggregates() {
        let validator = BatchValidator::new(config(), ProfileRegistry::amazon_defaults().clone())
            .unwrap()
            .with_bin_width(100)
            .unwrap();

        let dated: Candidate = serde_json::from_str(
            r#"{
                "type": "settlement",
                "coordinates": {"x": -54.0, "y": -13.0, "elevation": 250.0},
                "features": {},
                "area": 15000.0,
                "verification_scores": {"lidar": 0.9, "satellite": 0.8},
                "temporal_indicators": {
                    "estimated_age": 950,
                    "period": "late_pre_columbian",
                    "development_phase": "expansion"
                },
                "indigenous_knowledge": {
                    "sources": ["elder interview"],
                    "types": ["settlement_memory"],
                    "timeline": {
                        "dates": ["1400", "1500"],
                        "events": ["founding", "peak"]
                    }
                }
            }"#,
        )
        .unwrap();

        let undated = candidate_json(r#"{"historical": 0.75, "indigenous": 0.8}"#);

        let report = validator.validate_batch(&[dated, undated]);

        assert_eq!(report.temporal_development.dates, vec![900]);
        assert_eq!(report.temporal_development.sites, vec![1]);
        assert_eq!(report.temporal_development.undated, 1);

        let n = report.period_overlap.periods.len();
        assert_eq!(report.period_overlap.matrix.len(), n);
        for (i, row) in report.period_overlap.matrix.iter().enumerate() {
            assert_eq!(row[i], 1.0);
        }

        // Report serializes and round-trips losslessly.
        let json = serde_json::to_string(&report).unwrap();
        let back: BatchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary, report.summary);
        assert_eq!(back.temporal_development, report.temporal_development);
    }

    #[test]
    fn test_enrichment_is_additive_only() {
        let validator =
            BatchValidator::new(config(), ProfileRegistry::amazon_defaults().clone()).unwrap();
        let candidates = vec![candidate_json(r#"{"lidar": 0.9, "satellite": 0.8}"#)];

        let report = validator.validate_batch(&candidates);
        let outcome = &report.results[0];
        assert!(outcome.candidate.known_site_comparison.is_some());
        assert_eq!(
            outcome.candidate.verification_scores,
            candidates[0].verification_scores
        );
        assert_eq!(outcome.candidate.features, candidates[0].features);
    }
}
