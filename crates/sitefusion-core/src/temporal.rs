//! Temporal development tracker.
//!
//! Aggregates estimated-age evidence across a batch of candidates into
//! a time-binned development curve, and computes a period-overlap
//! matrix from indigenous-knowledge timelines.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Candidate, Period};

/// Bin-aligned counts of dated candidates.
///
/// Serializes as the `temporal_development{dates[], sites[]}` output:
/// `dates[k]` is the start of a bin in years before present and
/// `sites[k]` the number of candidates whose estimated age falls in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalDevelopment {
    pub dates: Vec<u32>,
    pub sites: Vec<usize>,

    /// Candidates without a temporal indicator. Reported separately,
    /// never silently dropped: dated + undated equals the input count.
    pub undated: usize,
}

/// Count candidates into age bins of `bin_width_years`.
///
/// A candidate's bin start is `floor(estimated_age / width) * width`.
/// Bins are emitted in ascending order and only where occupied.
pub fn bucketize(candidates: &[Candidate], bin_width_years: NonZeroU32) -> TemporalDevelopment {
    let width = bin_width_years.get();
    let mut bins: BTreeMap<u32, usize> = BTreeMap::new();
    let mut undated = 0usize;

    for candidate in candidates {
        match &candidate.temporal_indicators {
            Some(indicator) => {
                let start = (indicator.estimated_age / width) * width;
                *bins.entry(start).or_insert(0) += 1;
            }
            None => undated += 1,
        }
    }

    let (dates, sites) = bins.into_iter().unzip();
    TemporalDevelopment {
        dates,
        sites,
        undated,
    }
}

/// Symmetric period-overlap matrix over the full ordered period set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodOverlap {
    /// Row/column labels, in period order.
    pub periods: Vec<Period>,

    /// Square matrix of [0, 1] overlap scores; diagonal is 1.0.
    pub matrix: Vec<Vec<f64>>,
}

/// Compute period overlap from indigenous-knowledge timelines.
///
/// The directed fraction for (i, j) is the share of period-i candidates
/// whose timeline date range intersects at least one period-j
/// candidate's range. Since denominators differ per direction, the
/// matrix is symmetrized by averaging the two directed fractions. The
/// diagonal is pinned to 1.0: a period fully overlaps itself.
///
/// Candidates whose timelines fail validation have no usable range and
/// cannot intersect anything; they still count toward their period's
/// denominator (flagging happens in the validation engine, not here).
pub fn period_overlap(candidates: &[Candidate]) -> PeriodOverlap {
    let periods: Vec<Period> = Period::ALL.to_vec();

    // Per-period candidate timeline ranges (None where unusable).
    let mut ranges: BTreeMap<Period, Vec<Option<(NaiveDate, NaiveDate)>>> = BTreeMap::new();
    for candidate in candidates {
        let Some(indicator) = &candidate.temporal_indicators else {
            continue;
        };
        let range = candidate
            .indigenous_knowledge
            .as_ref()
            .and_then(|knowledge| knowledge.timeline.date_range().ok().flatten());
        ranges.entry(indicator.period).or_default().push(range);
    }

    let n = periods.len();
    let mut matrix = vec![vec![0.0; n]; n];

    for (i, &period_i) in periods.iter().enumerate() {
        for (j, &period_j) in periods.iter().enumerate() {
            matrix[i][j] = if i == j {
                1.0
            } else {
                let forward = directed_fraction(&ranges, period_i, period_j);
                let backward = directed_fraction(&ranges, period_j, period_i);
                (forward + backward) / 2.0
            };
        }
    }

    PeriodOverlap { periods, matrix }
}

fn directed_fraction(
    ranges: &BTreeMap<Period, Vec<Option<(NaiveDate, NaiveDate)>>>,
    from: Period,
    to: Period,
) -> f64 {
    let Some(from_ranges) = ranges.get(&from) else {
        return 0.0;
    };
    let empty = Vec::new();
    let to_ranges = ranges.get(&to).unwrap_or(&empty);

    let intersecting = from_ranges
        .iter()
        .filter(|range| {
            range.is_some_and(|a| {
                to_ranges
                    .iter()
                    .any(|other| other.is_some_and(|b| ranges_intersect(a, b)))
            })
        })
        .count();

    intersecting as f64 / from_ranges.len() as f64
}

fn ranges_intersect(a: (NaiveDate, NaiveDate), b: (NaiveDate, NaiveDate)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}
