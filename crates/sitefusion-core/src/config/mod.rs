//! Validation configuration parsing and validation.
//!
//! Thresholds, weights, and per-category validation settings are
//! structured data, loaded once before validation starts and treated as
//! immutable for the run. This module handles parsing YAML/JSON
//! configuration documents and validating them.

mod parser;
mod schema;

pub use parser::{
    ArtifactValidation, BoundaryValidation, ConfidenceThresholds, ConfigError,
    CorroborationConfig, DatingValidation, ErrorHandling, StratigraphyValidation,
    ValidationConfig,
};
pub use schema::{validate_config_schema, SchemaError};
