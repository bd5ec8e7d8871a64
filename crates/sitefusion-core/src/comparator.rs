//! Known-site comparator: similarity against reference feature profiles.
//!
//! Each profile is a canonical feature template for a previously
//! confirmed settlement type. Raw feature units differ (mound height in
//! meters, water access in kilometers), so every profile feature
//! carries a normalization range that maps absolute differences onto a
//! shared [0, 1] similarity scale.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::FeatureVector;
use crate::FusionError;

/// Errors when loading a profile registry from disk.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read profile registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Profile registry invalid: {0}")]
    Invalid(String),
}

/// One feature of a reference profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFeature {
    /// Canonical value for this settlement type.
    pub value: f64,

    /// Normalization range: differences at or beyond this count as
    /// fully dissimilar. Must be positive.
    pub range: f64,

    /// Optional feature weight; features without one weigh equally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// A named reference archetype for a known settlement type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownSiteProfile {
    /// Settlement-type name, e.g. "ring_village".
    pub name: String,

    pub features: BTreeMap<String, ProfileFeature>,
}

/// Fixed, externally supplied set of reference profiles.
///
/// Registration order is significant: similarity ties resolve to the
/// earliest-registered profile. The registry is never mutated during
/// validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileRegistry {
    profiles: Vec<KnownSiteProfile>,
}

lazy_static! {
    /// Built-in Amazonian reference profiles, used when no registry
    /// file is supplied. Feature values are representative of published
    /// site descriptions; ranges are the spans over which a difference
    /// is still considered comparable.
    static ref AMAZON_DEFAULTS: ProfileRegistry = ProfileRegistry {
        profiles: vec![
            KnownSiteProfile {
                name: "ring_village".to_string(),
                features: BTreeMap::from([
                    ("mound_height".to_string(), ProfileFeature { value: 2.0, range: 10.0, weight: None }),
                    ("area".to_string(), ProfileFeature { value: 20_000.0, range: 100_000.0, weight: None }),
                    ("water_access".to_string(), ProfileFeature { value: 0.5, range: 5.0, weight: None }),
                    ("ceramic_density".to_string(), ProfileFeature { value: 0.6, range: 1.0, weight: None }),
                ]),
            },
            KnownSiteProfile {
                name: "mound_complex".to_string(),
                features: BTreeMap::from([
                    ("mound_height".to_string(), ProfileFeature { value: 8.0, range: 10.0, weight: Some(2.0) }),
                    ("area".to_string(), ProfileFeature { value: 60_000.0, range: 200_000.0, weight: None }),
                    ("water_access".to_string(), ProfileFeature { value: 1.0, range: 5.0, weight: None }),
                ]),
            },
            KnownSiteProfile {
                name: "geoglyph_complex".to_string(),
                features: BTreeMap::from([
                    ("mound_height".to_string(), ProfileFeature { value: 0.5, range: 10.0, weight: None }),
                    ("area".to_string(), ProfileFeature { value: 40_000.0, range: 200_000.0, weight: None }),
                    ("slope".to_string(), ProfileFeature { value: 1.0, range: 15.0, weight: None }),
                ]),
            },
        ],
    };
}

impl ProfileRegistry {
    /// A registry from profiles in registration order.
    pub fn new(profiles: Vec<KnownSiteProfile>) -> Result<Self, RegistryError> {
        let registry = Self { profiles };
        registry.validate()?;
        Ok(registry)
    }

    /// The built-in Amazonian defaults.
    pub fn amazon_defaults() -> &'static ProfileRegistry {
        &AMAZON_DEFAULTS
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, RegistryError> {
        let registry: ProfileRegistry = serde_yaml::from_str(yaml)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let registry: ProfileRegistry = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Load from a file, dispatching on the `.json` extension and
    /// falling back to YAML otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    pub fn profiles(&self) -> &[KnownSiteProfile] {
        &self.profiles
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = std::collections::HashSet::new();
        for profile in &self.profiles {
            if !seen.insert(&profile.name) {
                return Err(RegistryError::Invalid(format!(
                    "duplicate profile name: {}",
                    profile.name
                )));
            }
            for (feature, spec) in &profile.features {
                if !spec.range.is_finite() || spec.range <= 0.0 {
                    return Err(RegistryError::Invalid(format!(
                        "profile '{}' feature '{}' has non-positive range {}",
                        profile.name, feature, spec.range
                    )));
                }
                if let Some(weight) = spec.weight {
                    if !weight.is_finite() || weight < 0.0 {
                        return Err(RegistryError::Invalid(format!(
                            "profile '{}' feature '{}' has invalid weight {}",
                            profile.name, feature, weight
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Comparator enrichment attached to a candidate: how closely its
/// features match the best reference profile.
///
/// Serializes as the `known_site_comparison` object of the exchange
/// format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteComparison {
    /// Name of the best-matching profile.
    pub known_site_type: String,

    /// Weighted mean of per-feature similarities, in [0, 1].
    pub overall_similarity: f64,

    /// Per-feature similarity for the best match, in [0, 1].
    pub features: BTreeMap<String, f64>,
}

/// Compare a candidate's features against every registry profile.
///
/// Per-feature similarity is `1 - |candidate - profile| / range`,
/// clamped to [0, 1], over the features present on both sides. The best
/// profile wins by maximum overall similarity; ties resolve to the
/// earliest-registered profile. Fails with
/// [`FusionError::EmptyFeatureVector`] when the candidate shares no
/// feature with any profile.
pub fn compare_to_known_sites(
    features: &FeatureVector,
    registry: &ProfileRegistry,
) -> Result<SiteComparison, FusionError> {
    let mut best: Option<SiteComparison> = None;

    for profile in registry.profiles() {
        let Some(comparison) = compare_to_profile(features, profile) else {
            continue;
        };

        // Strict > keeps the earliest-registered profile on ties.
        match &best {
            Some(current) if comparison.overall_similarity <= current.overall_similarity => {}
            _ => best = Some(comparison),
        }
    }

    best.ok_or(FusionError::EmptyFeatureVector)
}

fn compare_to_profile(
    features: &FeatureVector,
    profile: &KnownSiteProfile,
) -> Option<SiteComparison> {
    let mut per_feature = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for (name, spec) in &profile.features {
        let Some(&candidate_value) = features.get(name) else {
            continue;
        };
        let similarity = (1.0 - (candidate_value - spec.value).abs() / spec.range).clamp(0.0, 1.0);
        let weight = spec.weight.unwrap_or(1.0);

        per_feature.insert(name.clone(), similarity);
        weighted_sum += weight * similarity;
        weight_total += weight;
    }

    if weight_total <= 0.0 {
        return None;
    }

    Some(SiteComparison {
        known_site_type: profile.name.clone(),
        overall_similarity: (weighted_sum / weight_total).clamp(0.0, 1.0),
        features: per_feature,
    })
}
