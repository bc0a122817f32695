//! pgxguard-narrative — Clinical narrative generation.
//!
//! The pipeline depends only on the [`NarrativeGenerator`] capability;
//! the Gemini HTTP client and the deterministic fallback resolver are
//! interchangeable implementations behind it. See ARCHITECTURE.md §3.

pub mod fallback;
pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pgxguard_common::report::NarrativeExplanation;
use pgxguard_common::{Effect, Phenotype, Result, Zygosity};

/// Minimal view of an enriched variant carried into prompt context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSummary {
    pub rsid: String,
    pub gene: String,
    pub star_allele: String,
    pub zygosity: Zygosity,
    pub effect: Effect,
}

/// Everything a generator needs to explain one (patient, drug) result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeContext {
    pub gene: String,
    pub diplotype: String,
    pub phenotype: Phenotype,
    /// Uppercased drug name.
    pub drug: String,
    pub risk_label: String,
    pub severity: String,
    pub action: String,
    /// Present only when the phenotype came from activity scoring.
    pub activity_score: Option<f64>,
    pub variants: Vec<VariantSummary>,
}

/// Capability interface for narrative generation.
///
/// Implementations must not panic; a failed generation returns an
/// error and the caller substitutes the deterministic fallback.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, ctx: &NarrativeContext) -> Result<NarrativeExplanation>;
}
