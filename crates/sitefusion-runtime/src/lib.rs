//! # sitefusion-runtime
//!
//! Parallel batch validation runtime over `sitefusion-core`.
//!
//! Validation is embarrassingly parallel across candidates: each
//! candidate's pipeline reads only its own evidence plus shared
//! immutable configuration. This crate fans a batch out over a rayon
//! worker pool, collects per-candidate outcomes in input order, and
//! assembles the batch-level temporal structures.

pub mod batch;
pub mod report;

pub use batch::{BatchError, BatchValidator};
pub use report::{BatchReport, BatchSummary, CandidateOutcome};
