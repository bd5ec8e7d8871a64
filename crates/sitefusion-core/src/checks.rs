//! Structural category checks driven by configuration.
//!
//! These verify the shape of a candidate's evidence (expected features,
//! plausible layer counts, accepted dating methods) rather than its
//! confidence. Findings are advisory: they annotate the verdict as
//! warnings and never block it.

use crate::config::ValidationConfig;
use crate::engine::{Warning, WarningCode};
use crate::types::Candidate;

/// Feature key the stratigraphy check inspects, when present.
pub const STRATIGRAPHIC_LAYERS_FEATURE: &str = "stratigraphic_layers";

/// Run every configured structural check against a candidate.
pub fn structural_warnings(candidate: &Candidate, config: &ValidationConfig) -> Vec<Warning> {
    let mut warnings = Vec::new();
    check_artifact_fields(candidate, config, &mut warnings);
    check_stratigraphy_layers(candidate, config, &mut warnings);
    check_dating_method(candidate, config, &mut warnings);
    warnings
}

fn check_artifact_fields(
    candidate: &Candidate,
    config: &ValidationConfig,
    warnings: &mut Vec<Warning>,
) {
    let Some(artifact) = &config.artifact_validation else {
        return;
    };
    for field in &artifact.required_fields {
        if !candidate.features.contains_key(field) {
            warnings.push(Warning {
                code: WarningCode::MissingRequiredField,
                message: format!("artifact validation expects feature '{field}'"),
            });
        }
    }
}

fn check_stratigraphy_layers(
    candidate: &Candidate,
    config: &ValidationConfig,
    warnings: &mut Vec<Warning>,
) {
    let Some(stratigraphy) = &config.stratigraphy_validation else {
        return;
    };
    let Some(&layers) = candidate.features.get(STRATIGRAPHIC_LAYERS_FEATURE) else {
        return;
    };

    let layers = layers.round() as i64;
    if layers < i64::from(stratigraphy.min_layers) || layers > i64::from(stratigraphy.max_layers) {
        warnings.push(Warning {
            code: WarningCode::LayerCountOutOfRange,
            message: format!(
                "{layers} stratigraphic layers outside accepted {}..={}",
                stratigraphy.min_layers, stratigraphy.max_layers
            ),
        });
    }
}

fn check_dating_method(
    candidate: &Candidate,
    config: &ValidationConfig,
    warnings: &mut Vec<Warning>,
) {
    let Some(dating) = &config.dating_validation else {
        return;
    };
    let Some(method) = candidate
        .temporal_indicators
        .as_ref()
        .and_then(|indicator| indicator.dating_method.as_deref())
    else {
        return;
    };

    let allowed = dating
        .allowed_methods
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(method));
    if !allowed {
        warnings.push(Warning {
            code: WarningCode::DisallowedDatingMethod,
            message: format!("dating method '{method}' is not in allowed_methods"),
        });
    }
}
