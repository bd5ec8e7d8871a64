//! Per-source evidence scores for a candidate site.
//!
//! Each candidate carries at most one confidence score per evidence
//! source. A source that produced no observation is *absent*, which is
//! distinct from a source that observed with zero confidence; absence
//! must never be defaulted to 0.0.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::FusionError;

/// The closed set of independent evidence channels.
///
/// Upstream collaborators (raster pipelines, document analysis, oral
/// record ingestion) each feed exactly one of these channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Elevation and terrain anomalies from LIDAR-derived models.
    Lidar,
    /// Vegetation and spectral signatures from satellite imagery.
    Satellite,
    /// Inference from colonial diaries and other historical documents.
    Historical,
    /// Indigenous oral-knowledge records.
    Indigenous,
    /// Estimated-age and period evidence.
    Temporal,
}

impl SourceKind {
    /// All source kinds, in the canonical order used throughout the engine.
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Lidar,
        SourceKind::Satellite,
        SourceKind::Historical,
        SourceKind::Indigenous,
        SourceKind::Temporal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Lidar => "lidar",
            SourceKind::Satellite => "satellite",
            SourceKind::Historical => "historical",
            SourceKind::Indigenous => "indigenous",
            SourceKind::Temporal => "temporal",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lidar" => Ok(SourceKind::Lidar),
            "satellite" => Ok(SourceKind::Satellite),
            "historical" => Ok(SourceKind::Historical),
            "indigenous" => Ok(SourceKind::Indigenous),
            "temporal" => Ok(SourceKind::Temporal),
            other => Err(FusionError::UnknownSource(other.to_string())),
        }
    }
}

/// Per-source confidence scores, each in [0.0, 1.0].
///
/// Serializes as the `verification_scores` object of the exchange
/// format: only present sources appear as keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<SourceKind, f64>", into = "BTreeMap<SourceKind, f64>")]
pub struct EvidenceScores {
    scores: BTreeMap<SourceKind, f64>,
}

impl EvidenceScores {
    /// An empty score set: every source absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a score for a source, replacing any previous value.
    ///
    /// Rejects values outside [0.0, 1.0] and non-finite values.
    pub fn set(&mut self, kind: SourceKind, score: f64) -> Result<(), FusionError> {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(FusionError::ScoreOutOfRange { kind, score });
        }
        self.scores.insert(kind, score);
        Ok(())
    }

    /// The score for a source, or `None` if that source is absent.
    pub fn get(&self, kind: SourceKind) -> Option<f64> {
        self.scores.get(&kind).copied()
    }

    /// Number of sources that produced a score.
    pub fn present_count(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Present (source, score) pairs in canonical source order.
    pub fn iter(&self) -> impl Iterator<Item = (SourceKind, f64)> + '_ {
        self.scores.iter().map(|(k, v)| (*k, *v))
    }
}

impl TryFrom<BTreeMap<SourceKind, f64>> for EvidenceScores {
    type Error = FusionError;

    fn try_from(map: BTreeMap<SourceKind, f64>) -> Result<Self, Self::Error> {
        let mut scores = EvidenceScores::new();
        for (kind, score) in map {
            scores.set(kind, score)?;
        }
        Ok(scores)
    }
}

impl From<EvidenceScores> for BTreeMap<SourceKind, f64> {
    fn from(scores: EvidenceScores) -> Self {
        scores.scores
    }
}
