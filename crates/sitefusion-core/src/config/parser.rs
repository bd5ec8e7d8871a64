//! Configuration parsing from YAML/JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corroborate::CorroborationPolicy;
use crate::evidence::SourceKind;
use crate::types::Category;

/// Errors that can occur when parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Per-category composite confidence thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub boundary: f64,
    pub artifact: f64,
    pub stratigraphy: f64,
    pub dating: f64,
    pub overall: f64,
}

impl ConfidenceThresholds {
    pub fn for_category(&self, category: Category) -> f64 {
        match category {
            Category::Boundary => self.boundary,
            Category::Artifact => self.artifact,
            Category::Stratigraphy => self.stratigraphy,
            Category::Dating => self.dating,
            Category::Overall => self.overall,
        }
    }
}

/// Source weights for boundary validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryValidation {
    pub lidar_weight: f64,
    pub satellite_weight: f64,
}

/// Feature names an artifact-bearing candidate is expected to carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactValidation {
    #[serde(default)]
    pub required_fields: Vec<String>,
}

/// Acceptable stratigraphic layer counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StratigraphyValidation {
    pub min_layers: u32,
    pub max_layers: u32,
}

/// Dating methods the run accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatingValidation {
    #[serde(default)]
    pub allowed_methods: Vec<String>,
}

/// Retry settings for the upstream ingestion collaborators.
///
/// Carried in the configuration document per the exchange contract but
/// unused by this engine: retries belong to the evidence producers, not
/// to CPU-bound fusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorHandling {
    pub max_retries: u32,
    /// Seconds between retries.
    pub retry_delay: f64,
}

/// Corroboration gate settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorroborationConfig {
    #[serde(default = "default_min_independent_sources")]
    pub min_independent_sources: usize,

    #[serde(default = "default_per_source_threshold")]
    pub default_threshold: f64,

    /// Per-source threshold overrides, keyed by source name.
    #[serde(default)]
    pub per_source_threshold: BTreeMap<String, f64>,

    /// Categories where one qualifying source is acceptable.
    #[serde(default)]
    pub single_source_categories: Vec<Category>,
}

fn default_min_independent_sources() -> usize {
    2
}

fn default_per_source_threshold() -> f64 {
    0.7
}

fn default_mandatory_categories() -> Vec<Category> {
    vec![Category::Overall]
}

impl Default for CorroborationConfig {
    fn default() -> Self {
        Self {
            min_independent_sources: default_min_independent_sources(),
            default_threshold: default_per_source_threshold(),
            per_source_threshold: BTreeMap::new(),
            single_source_categories: Vec::new(),
        }
    }
}

/// A validation run's configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub confidence_thresholds: ConfidenceThresholds,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_validation: Option<BoundaryValidation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_validation: Option<ArtifactValidation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stratigraphy_validation: Option<StratigraphyValidation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dating_validation: Option<DatingValidation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_handling: Option<ErrorHandling>,

    /// Categories whose aggregation failure rejects the candidate.
    #[serde(default = "default_mandatory_categories")]
    pub mandatory_categories: Vec<Category>,

    #[serde(default)]
    pub corroboration: CorroborationConfig,

    /// Weight-table overrides, keyed by category and source name.
    #[serde(default)]
    pub category_weights: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ValidationConfig {
    /// Parse from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: ValidationConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ValidationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, dispatching on the `.json` extension and
    /// falling back to YAML otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Whether an aggregation failure on this category rejects the
    /// candidate.
    pub fn is_mandatory(&self, category: Category) -> bool {
        self.mandatory_categories.contains(&category)
    }

    /// Whether this category accepts a single qualifying source
    /// instead of full corroboration.
    pub fn is_single_source_acceptable(&self, category: Category) -> bool {
        self.corroboration
            .single_source_categories
            .contains(&category)
    }

    /// Build the corroboration gate policy from this configuration.
    ///
    /// Source names were already resolved by [`Self::validate`], so the
    /// conversion is infallible here.
    pub fn corroboration_policy(&self) -> CorroborationPolicy {
        let per_source = self
            .corroboration
            .per_source_threshold
            .iter()
            .filter_map(|(name, &threshold)| {
                SourceKind::from_str(name).ok().map(|kind| (kind, threshold))
            })
            .collect();

        CorroborationPolicy {
            min_independent_sources: self.corroboration.min_independent_sources,
            default_threshold: self.corroboration.default_threshold,
            per_source,
        }
    }

    /// Validate the parsed configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        for category in Category::ALL {
            let threshold = self.confidence_thresholds.for_category(category);
            if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::ValidationError(format!(
                    "confidence_thresholds.{category} out of range: {threshold}"
                )));
            }
        }

        if let Some(boundary) = &self.boundary_validation {
            for (name, weight) in [
                ("lidar_weight", boundary.lidar_weight),
                ("satellite_weight", boundary.satellite_weight),
            ] {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(ConfigError::ValidationError(format!(
                        "boundary_validation.{name} must be non-negative: {weight}"
                    )));
                }
            }
        }

        if let Some(stratigraphy) = &self.stratigraphy_validation {
            if stratigraphy.min_layers > stratigraphy.max_layers {
                return Err(ConfigError::ValidationError(format!(
                    "stratigraphy_validation: min_layers {} exceeds max_layers {}",
                    stratigraphy.min_layers, stratigraphy.max_layers
                )));
            }
        }

        if self.corroboration.min_independent_sources == 0 {
            return Err(ConfigError::ValidationError(
                "corroboration.min_independent_sources must be at least 1".to_string(),
            ));
        }

        let mut thresholds: Vec<(&str, f64)> = vec![(
            "corroboration.default_threshold",
            self.corroboration.default_threshold,
        )];
        for (name, &threshold) in &self.corroboration.per_source_threshold {
            SourceKind::from_str(name).map_err(|_| {
                ConfigError::ValidationError(format!(
                    "corroboration.per_source_threshold references unknown source '{name}'"
                ))
            })?;
            thresholds.push((name, threshold));
        }
        for (name, threshold) in thresholds {
            if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} out of range: {threshold}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
confidence_thresholds:
  boundary: 0.7
  artifact: 0.6
  stratigraphy: 0.65
  dating: 0.6
  overall: 0.7
boundary_validation:
  lidar_weight: 0.6
  satellite_weight: 0.4
artifact_validation:
  required_fields:
    - ceramic_density
    - mound_height
stratigraphy_validation:
  min_layers: 2
  max_layers: 12
dating_validation:
  allowed_methods:
    - radiocarbon
    - stratigraphic_correlation
error_handling:
  max_retries: 3
  retry_delay: 2.5
"#;

    #[test]
    fn test_parse_valid_config() {
        let config = ValidationConfig::from_yaml(VALID_CONFIG).unwrap();
        assert_eq!(config.confidence_thresholds.boundary, 0.7);
        assert_eq!(
            config.boundary_validation.unwrap().lidar_weight,
            0.6
        );
        assert_eq!(config.mandatory_categories, vec![Category::Overall]);
        assert_eq!(config.corroboration.min_independent_sources, 2);
        assert_eq!(config.corroboration.default_threshold, 0.7);
    }

    #[test]
    fn test_json_and_yaml_agree() {
        let yaml = ValidationConfig::from_yaml(VALID_CONFIG).unwrap();
        let json = serde_json::to_string(&yaml).unwrap();
        let reparsed = ValidationConfig::from_json(&json).unwrap();
        assert_eq!(yaml, reparsed);
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let yaml = r#"
confidence_thresholds:
  boundary: 1.3
  artifact: 0.6
  stratigraphy: 0.6
  dating: 0.6
  overall: 0.7
"#;
        assert!(matches!(
            ValidationConfig::from_yaml(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_layer_bounds_checked() {
        let yaml = r#"
confidence_thresholds:
  boundary: 0.7
  artifact: 0.6
  stratigraphy: 0.6
  dating: 0.6
  overall: 0.7
stratigraphy_validation:
  min_layers: 10
  max_layers: 3
"#;
        assert!(matches!(
            ValidationConfig::from_yaml(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_unknown_corroboration_source_rejected() {
        let yaml = r#"
confidence_thresholds:
  boundary: 0.7
  artifact: 0.6
  stratigraphy: 0.6
  dating: 0.6
  overall: 0.7
corroboration:
  per_source_threshold:
    sonar: 0.5
"#;
        assert!(matches!(
            ValidationConfig::from_yaml(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_corroboration_policy_built_from_config() {
        let yaml = r#"
confidence_thresholds:
  boundary: 0.7
  artifact: 0.6
  stratigraphy: 0.6
  dating: 0.6
  overall: 0.7
corroboration:
  min_independent_sources: 3
  default_threshold: 0.6
  per_source_threshold:
    historical: 0.5
  single_source_categories:
    - dating
"#;
        let config = ValidationConfig::from_yaml(yaml).unwrap();
        let policy = config.corroboration_policy();
        assert_eq!(policy.min_independent_sources, 3);
        assert_eq!(policy.threshold_for(SourceKind::Historical), 0.5);
        assert_eq!(policy.threshold_for(SourceKind::Lidar), 0.6);
        assert!(config.is_single_source_acceptable(Category::Dating));
        assert!(!config.is_single_source_acceptable(Category::Overall));
    }
}
