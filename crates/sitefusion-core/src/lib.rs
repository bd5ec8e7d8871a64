//! # sitefusion-core
//!
//! Deterministic multi-evidence fusion and site validation engine.
//!
//! Fuses independently noisy evidence channels about a candidate
//! location (terrain anomalies, satellite spectral signatures,
//! historical-document inference, indigenous oral-knowledge records)
//! into one auditable confidence judgment, answering:
//! - How confident are we, per validation category and overall?
//! - Is the candidate independently corroborated?
//! - Which known settlement type does it most resemble?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same candidate and configuration always produce
//!    the same verdict (timestamps aside)
//! 2. **Absence is not zero**: a missing evidence source never deflates
//!    confidence; it is re-normalized away or rejected explicitly
//! 3. **Traceable**: every verdict carries per-category composites,
//!    contributing/missing sources, and machine-readable reason codes
//! 4. **Parallel-safe**: validation reads only the candidate plus shared
//!    immutable configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use sitefusion_core::{Candidate, ProfileRegistry, ValidationConfig, ValidationEngine};
//!
//! let config = ValidationConfig::from_file("validation.yaml")?;
//! let registry = ProfileRegistry::amazon_defaults().clone();
//! let engine = ValidationEngine::new(config, registry)?;
//!
//! let candidate: Candidate = serde_json::from_str(record)?;
//! let verdict = engine.validate(&candidate);
//! println!("confidence: {:?}", verdict.confidence());
//! ```

pub mod aggregate;
pub mod checks;
pub mod comparator;
pub mod config;
pub mod corroborate;
pub mod engine;
pub mod evidence;
pub mod temporal;
pub mod types;
pub mod weights;

// Re-export main types at crate root
pub use aggregate::{aggregate, Aggregate};
pub use comparator::{
    compare_to_known_sites, KnownSiteProfile, ProfileFeature, ProfileRegistry, RegistryError,
    SiteComparison,
};
pub use config::{ConfigError, ValidationConfig};
pub use corroborate::{is_corroborated, CorroborationPolicy};
pub use engine::{
    CategoryOutcome, RejectionReason, ValidationEngine, ValidationState, Verdict, VerdictState,
    Warning, WarningCode,
};
pub use evidence::{EvidenceScores, SourceKind};
pub use temporal::{bucketize, period_overlap, PeriodOverlap, TemporalDevelopment};
pub use types::{
    Candidate, Category, Coordinate, FeatureVector, IndigenousKnowledge, Period,
    TemporalIndicator, Timeline,
};
pub use weights::WeightingPolicy;

use thiserror::Error;

/// Errors that can occur during evidence fusion and validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    /// Configuration references a category outside the closed set.
    /// Fatal to the validation run, not to the process.
    #[error("Unknown validation category: {0}")]
    UnknownCategory(String),

    /// Configuration or input references an evidence source outside
    /// the closed set.
    #[error("Unknown evidence source: {0}")]
    UnknownSource(String),

    /// A category had zero present weighted sources. Never silently
    /// treated as confidence 0.
    #[error("Insufficient evidence for category '{category}'")]
    InsufficientEvidence { category: Category },

    /// The comparator found no features shared with any profile.
    #[error("No comparable features overlap any known-site profile")]
    EmptyFeatureVector,

    /// An indigenous-knowledge timeline is malformed or out of order.
    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    /// An evidence score outside [0, 1].
    #[error("Score for source '{kind}' out of range: {score}")]
    ScoreOutOfRange { kind: SourceKind, score: f64 },

    /// A negative or non-finite weight in a weighting table.
    #[error("Invalid weight {weight} for source '{kind}' in category '{category}'")]
    InvalidWeight {
        category: Category,
        kind: SourceKind,
        weight: f64,
    },
}

/// Validate one candidate with freshly built policy state.
///
/// This is the convenience entry point; batch callers should build a
/// [`ValidationEngine`] once and reuse it across candidates.
pub fn validate(
    candidate: &Candidate,
    config: &ValidationConfig,
    registry: &ProfileRegistry,
) -> Result<Verdict, FusionError> {
    let engine = ValidationEngine::new(config.clone(), registry.clone())?;
    Ok(engine.validate(candidate))
}
