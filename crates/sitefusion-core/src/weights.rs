//! Weighting policy: evidence-source weights per validation category.
//!
//! The policy is configuration data, built once before validation
//! starts and treated as immutable for the run. Category names are a
//! closed enum, so an unknown category in configuration is caught while
//! the policy is built ([`FusionError::UnknownCategory`], fatal to the
//! run) rather than mid-validation.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::ValidationConfig;
use crate::evidence::SourceKind;
use crate::types::Category;
use crate::FusionError;

/// Ordered per-category (source, weight) tables.
///
/// Weights are non-negative and need not sum to 1; the aggregator
/// normalizes over the sources that are present.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightingPolicy {
    tables: BTreeMap<Category, Vec<(SourceKind, f64)>>,
}

impl WeightingPolicy {
    /// The built-in defaults: boundary validation weighs lidar 0.6 and
    /// satellite 0.4; every other category weighs all five sources
    /// equally. These are configuration defaults, not derived constants.
    pub fn defaults() -> Self {
        let mut tables = BTreeMap::new();
        for category in Category::ALL {
            let table = match category {
                Category::Boundary => vec![(SourceKind::Lidar, 0.6), (SourceKind::Satellite, 0.4)],
                _ => SourceKind::ALL.iter().map(|&kind| (kind, 1.0)).collect(),
            };
            tables.insert(category, table);
        }
        Self { tables }
    }

    /// Build the policy from configuration: defaults overlaid with the
    /// `boundary_validation` weights and any `category_weights` tables.
    pub fn from_config(config: &ValidationConfig) -> Result<Self, FusionError> {
        let mut policy = Self::defaults();

        if let Some(boundary) = &config.boundary_validation {
            let table = vec![
                (SourceKind::Lidar, boundary.lidar_weight),
                (SourceKind::Satellite, boundary.satellite_weight),
            ];
            Self::check_weights(Category::Boundary, &table)?;
            policy.tables.insert(Category::Boundary, table);
        }

        for (category_name, sources) in &config.category_weights {
            let category = Category::from_str(category_name)?;
            let mut table = Vec::with_capacity(sources.len());
            for (source_name, &weight) in sources {
                table.push((SourceKind::from_str(source_name)?, weight));
            }
            Self::check_weights(category, &table)?;
            policy.tables.insert(category, table);
        }

        Ok(policy)
    }

    /// The ordered (source, weight) pairs for a category.
    pub fn for_category(&self, category: Category) -> &[(SourceKind, f64)] {
        // Every Category variant has a table: defaults() seeds all of
        // them and from_config only replaces entries.
        &self.tables[&category]
    }

    fn check_weights(category: Category, table: &[(SourceKind, f64)]) -> Result<(), FusionError> {
        for &(kind, weight) in table {
            if !weight.is_finite() || weight < 0.0 {
                return Err(FusionError::InvalidWeight {
                    category,
                    kind,
                    weight,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;

    #[test]
    fn test_default_boundary_weights() {
        let policy = WeightingPolicy::defaults();
        let table = policy.for_category(Category::Boundary);
        assert_eq!(
            table,
            &[(SourceKind::Lidar, 0.6), (SourceKind::Satellite, 0.4)]
        );
    }

    #[test]
    fn test_default_overall_weights_cover_all_sources() {
        let policy = WeightingPolicy::defaults();
        let table = policy.for_category(Category::Overall);
        assert_eq!(table.len(), 5);
        assert!(table.iter().all(|&(_, w)| w == 1.0));
    }

    #[test]
    fn test_config_overrides_boundary_weights() {
        let config = ValidationConfig::from_yaml(
            r#"
confidence_thresholds:
  boundary: 0.7
  artifact: 0.6
  stratigraphy: 0.6
  dating: 0.6
  overall: 0.7
boundary_validation:
  lidar_weight: 0.8
  satellite_weight: 0.2
"#,
        )
        .unwrap();

        let policy = WeightingPolicy::from_config(&config).unwrap();
        let table = policy.for_category(Category::Boundary);
        assert_eq!(
            table,
            &[(SourceKind::Lidar, 0.8), (SourceKind::Satellite, 0.2)]
        );
    }

    #[test]
    fn test_unknown_category_in_overrides_is_fatal() {
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

        assert!(matches!(
            WeightingPolicy::from_config(&config),
            Err(FusionError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = ValidationConfig::from_yaml(
            r#"
confidence_thresholds:
  boundary: 0.7
  artifact: 0.6
  stratigraphy: 0.6
  dating: 0.6
  overall: 0.7
category_weights:
  dating:
    temporal: -0.2
"#,
        )
        .unwrap();

        assert!(matches!(
            WeightingPolicy::from_config(&config),
            Err(FusionError::InvalidWeight { .. })
        ));
    }
}
