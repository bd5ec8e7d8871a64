//! Core data model for candidate sites and validation categories.
//!
//! Field names follow the structured evidence format produced by the
//! upstream ingestion collaborators (`coordinates{x,y,elevation}`,
//! `verification_scores{...}`, `temporal_indicators{...}`, ...), so a
//! candidate parsed from that format re-serializes losslessly.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::comparator::SiteComparison;
use crate::evidence::EvidenceScores;
use crate::FusionError;

lazy_static! {
    /// Full date as produced by document analysis: YYYY-MM-DD.
    static ref FULL_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();

    /// Bare year, as oral-record timelines often carry.
    static ref BARE_YEAR: Regex = Regex::new(r"^\d{1,4}$").unwrap();
}

/// The closed set of validation categories, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Boundary,
    Artifact,
    Stratigraphy,
    Dating,
    Overall,
}

impl Category {
    /// All categories in the fixed order the engine evaluates them.
    pub const ALL: [Category; 5] = [
        Category::Boundary,
        Category::Artifact,
        Category::Stratigraphy,
        Category::Dating,
        Category::Overall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Boundary => "boundary",
            Category::Artifact => "artifact",
            Category::Stratigraphy => "stratigraphy",
            Category::Dating => "dating",
            Category::Overall => "overall",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boundary" => Ok(Category::Boundary),
            "artifact" => Ok(Category::Artifact),
            "stratigraphy" => Ok(Category::Stratigraphy),
            "dating" => Ok(Category::Dating),
            "overall" => Ok(Category::Overall),
            other => Err(FusionError::UnknownCategory(other.to_string())),
        }
    }
}

/// Geographic position of a candidate. Immutable once attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude in decimal degrees.
    pub x: f64,
    /// Latitude in decimal degrees.
    pub y: f64,
    /// Elevation in meters above sea level.
    #[serde(default)]
    pub elevation: f64,
}

/// Named feature measurements. Units vary per feature and are only
/// comparable through a profile's normalization range.
pub type FeatureVector = BTreeMap<String, f64>;

/// Ordered cultural periods for the study region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    EarlyPreColumbian,
    LatePreColumbian,
    Contact,
    Colonial,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::EarlyPreColumbian,
        Period::LatePreColumbian,
        Period::Contact,
        Period::Colonial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::EarlyPreColumbian => "early_pre_columbian",
            Period::LatePreColumbian => "late_pre_columbian",
            Period::Contact => "contact",
            Period::Colonial => "colonial",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated-age and period evidence for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalIndicator {
    /// Estimated age in years before present.
    pub estimated_age: u32,

    /// Cultural period the age falls in.
    pub period: Period,

    /// Development phase label (e.g. "expansion", "abandonment").
    #[serde(default)]
    pub development_phase: String,

    /// How the age estimate was obtained, if known
    /// (checked against `dating_validation.allowed_methods`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dating_method: Option<String>,
}

/// An ordered (date, event) timeline from an oral-knowledge record.
///
/// Dates and events are parallel arrays in the exchange format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub dates: Vec<String>,

    #[serde(default)]
    pub events: Vec<String>,
}

impl Timeline {
    /// Parse one timeline date: `YYYY-MM-DD`, or a bare year taken as
    /// January 1 of that year.
    pub fn parse_date(raw: &str) -> Result<NaiveDate, FusionError> {
        let trimmed = raw.trim();
        if FULL_DATE.is_match(trimmed) {
            return NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map_err(|_| FusionError::InvalidTimeline(format!("unparseable date '{raw}'")));
        }
        if BARE_YEAR.is_match(trimmed) {
            let year: i32 = trimmed
                .parse()
                .map_err(|_| FusionError::InvalidTimeline(format!("unparseable year '{raw}'")))?;
            return NaiveDate::from_ymd_opt(year, 1, 1)
                .ok_or_else(|| FusionError::InvalidTimeline(format!("invalid year '{raw}'")));
        }
        Err(FusionError::InvalidTimeline(format!(
            "unrecognized date format '{raw}'"
        )))
    }

    /// Validate the record: parallel arrays must agree in length and
    /// dates must be non-decreasing. Invalid records are flagged, never
    /// silently sorted.
    pub fn validate(&self) -> Result<Vec<NaiveDate>, FusionError> {
        if self.dates.len() != self.events.len() {
            return Err(FusionError::InvalidTimeline(format!(
                "{} dates but {} events",
                self.dates.len(),
                self.events.len()
            )));
        }

        let mut parsed = Vec::with_capacity(self.dates.len());
        for raw in &self.dates {
            parsed.push(Self::parse_date(raw)?);
        }

        for window in parsed.windows(2) {
            if window[1] < window[0] {
                return Err(FusionError::InvalidTimeline(format!(
                    "dates not non-decreasing: {} follows {}",
                    window[1], window[0]
                )));
            }
        }

        Ok(parsed)
    }

    /// The (earliest, latest) dates of a valid timeline, or `None` for
    /// an empty one.
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, FusionError> {
        let parsed = self.validate()?;
        Ok(parsed
            .first()
            .zip(parsed.last())
            .map(|(first, last)| (*first, *last)))
    }
}

/// Indigenous oral-knowledge record attached to a candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndigenousKnowledge {
    /// Free-text provenance of the record.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Knowledge-type tags (e.g. "settlement_memory", "sacred_site").
    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub timeline: Timeline,
}

/// A candidate location under evaluation for archaeological significance.
///
/// Created by upstream evidence producers; enriched additively by the
/// comparator and temporal tracker; read-only to the validation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Assigned type tag (e.g. "settlement", "potential_archaeological_site").
    #[serde(rename = "type")]
    pub site_type: String,

    pub coordinates: Coordinate,

    /// Upstream detection confidence, before fusion.
    #[serde(default)]
    pub confidence: f64,

    #[serde(default)]
    pub features: FeatureVector,

    /// Estimated extent, square units consistent with coordinate units.
    #[serde(default)]
    pub area: f64,

    #[serde(default)]
    pub verification_scores: EvidenceScores,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_indicators: Option<TemporalIndicator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indigenous_knowledge: Option<IndigenousKnowledge>,

    /// Comparator enrichment, when a best match was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_site_comparison: Option<SiteComparison>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::SourceKind;

    fn sample_candidate_json() -> &'static str {
        r#"{
            "type": "potential_archaeological_site",
            "coordinates": {"x": -54.0, "y": -13.0, "elevation": 312.5},
            "confidence": 0.8,
            "features": {"mound_height": 4.5, "ndvi_mean": 0.52},
            "area": 12500.0,
            "verification_scores": {"lidar": 0.9, "satellite": 0.8},
            "temporal_indicators": {
                "estimated_age": 950,
                "period": "late_pre_columbian",
                "development_phase": "expansion"
            },
            "indigenous_knowledge": {
                "sources": ["elder interview 2019"],
                "types": ["settlement_memory"],
                "timeline": {
                    "dates": ["1450-03-01", "1500"],
                    "events": ["village founded", "village abandoned"]
                }
            }
        }"#
    }

    #[test]
    fn test_candidate_round_trip_is_lossless() {
        let candidate: Candidate = serde_json::from_str(sample_candidate_json()).unwrap();
        let json = serde_json::to_string(&candidate).unwrap();
        let reparsed: Candidate = serde_json::from_str(&json).unwrap();

        assert_eq!(candidate, reparsed);
        // Numeric fields bit-identical.
        assert_eq!(
            candidate.coordinates.elevation.to_bits(),
            reparsed.coordinates.elevation.to_bits()
        );
        assert_eq!(
            candidate
                .verification_scores
                .get(SourceKind::Lidar)
                .unwrap()
                .to_bits(),
            reparsed
                .verification_scores
                .get(SourceKind::Lidar)
                .unwrap()
                .to_bits()
        );
    }

    #[test]
    fn test_timeline_valid_range() {
        let timeline = Timeline {
            dates: vec!["1450-03-01".into(), "1500".into()],
            events: vec!["founded".into(), "abandoned".into()],
        };
        let (start, end) = timeline.date_range().unwrap().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(1450, 3, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(1500, 1, 1).unwrap());
    }

    #[test]
    fn test_timeline_decreasing_dates_flagged() {
        let timeline = Timeline {
            dates: vec!["1500".into(), "1450".into()],
            events: vec!["a".into(), "b".into()],
        };
        assert!(matches!(
            timeline.validate(),
            Err(FusionError::InvalidTimeline(_))
        ));
    }

    #[test]
    fn test_timeline_length_mismatch_flagged() {
        let timeline = Timeline {
            dates: vec!["1500".into()],
            events: vec![],
        };
        assert!(matches!(
            timeline.validate(),
            Err(FusionError::InvalidTimeline(_))
        ));
    }

    #[test]
    fn test_timeline_bad_format_flagged() {
        assert!(Timeline::parse_date("circa 1500").is_err());
        assert!(Timeline::parse_date("15000-01-01").is_err());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("boundary".parse::<Category>().unwrap(), Category::Boundary);
        assert!(matches!(
            "geophysics".parse::<Category>(),
            Err(FusionError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_period_ordering() {
        assert!(Period::EarlyPreColumbian < Period::LatePreColumbian);
        assert!(Period::LatePreColumbian < Period::Contact);
        assert!(Period::Contact < Period::Colonial);
    }
}
