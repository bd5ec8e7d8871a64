//! Batch report: per-candidate outcomes plus aggregate structures.

use serde::{Deserialize, Serialize};

use sitefusion_core::{Candidate, PeriodOverlap, TemporalDevelopment, Verdict};

/// One candidate's validation outcome within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOutcome {
    /// Position of the candidate in the input batch.
    pub index: usize,

    /// The candidate, enriched with the comparator's best match when
    /// one was found (additive field only; evidence is untouched).
    pub candidate: Candidate,

    pub verdict: Verdict,
}

/// Counts over a batch's terminal states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Candidates that received a confidence judgment.
    pub verdicted: usize,

    /// Candidates rejected for missing mandatory evidence.
    pub rejected: usize,

    /// Candidates carrying at least one warning.
    pub with_warnings: usize,
}

/// The full output of a batch validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<CandidateOutcome>,

    pub summary: BatchSummary,

    /// Bin-aligned dated-site counts across the batch.
    pub temporal_development: TemporalDevelopment,

    /// Period-overlap matrix across the batch.
    pub period_overlap: PeriodOverlap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitefusion_core::Period;

    #[test]
    fn test_report_round_trip() {
        let report = BatchReport {
            results: vec![],
            summary: BatchSummary {
                verdicted: 3,
                rejected: 1,
                with_warnings: 2,
            },
            temporal_development: TemporalDevelopment {
                dates: vec![0, 500],
                sites: vec![2, 1],
                undated: 1,
            },
            period_overlap: PeriodOverlap {
                periods: Period::ALL.to_vec(),
                matrix: vec![vec![1.0; 4]; 4],
            },
        };

        let json = serde_json::to_string(&report).unwrap();
        let reparsed: BatchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, reparsed);
    }
}
