//! pgxguard-core — Deterministic variant-to-risk inference pipeline.
//!
//! Stages run strictly forward: raw VCF text → variant records →
//! enriched variants → diplotype/phenotype → risk verdict → narrative.
//! Every stage degrades gracefully; the pipeline always produces a
//! verdict flagged with its confidence rather than failing on
//! imperfect input. See ARCHITECTURE.md §2.

pub mod diplotype;
pub mod enrich;
pub mod pipeline;
pub mod predictor;
pub mod reference;
pub mod risk;
pub mod vcf;

pub use pipeline::{AnalysisRequest, Pipeline};
pub use reference::ReferenceTables;
