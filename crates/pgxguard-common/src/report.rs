//! Per-drug analysis report emitted by the pipeline.
//!
//! The JSON shape is the tool's external contract: downstream viewers
//! and report archives consume it verbatim, so field names here are
//! load-bearing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phenotype::Phenotype;
use crate::variant::Zygosity;

/// One variant retained for the analyzed gene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedVariant {
    pub rsid: String,
    pub gene: String,
    pub star_allele: String,
    pub zygosity: Zygosity,
    pub clinical_significance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub risk_label: String,
    pub confidence_score: f64,
    pub severity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PharmacogenomicProfile {
    pub primary_gene: String,
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub detected_variants: Vec<DetectedVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalRecommendation {
    pub action: String,
    pub dose_adjustment: String,
    pub alternative_drugs: Vec<String>,
    pub monitoring_required: bool,
    pub cpic_guideline_ref: String,
}

/// Clinical narrative, either from the narrative service or the
/// deterministic fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NarrativeExplanation {
    pub summary: String,
    pub mechanism: String,
    pub clinical_context: String,
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityMetrics {
    pub vcf_parsing_success: bool,
    pub variants_detected: usize,
    pub genes_analyzed: Vec<String>,
    /// Gene-specific enriched variants ÷ total enriched variants,
    /// rounded to 2 decimals. 0.0 when nothing was enriched.
    pub annotation_completeness: f64,
}

/// Complete per-drug result object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugReport {
    pub patient_id: String,
    pub drug: String,
    pub timestamp: DateTime<Utc>,
    pub risk_assessment: RiskAssessment,
    pub pharmacogenomic_profile: PharmacogenomicProfile,
    pub clinical_recommendation: ClinicalRecommendation,
    pub explanation: NarrativeExplanation,
    pub quality_metrics: QualityMetrics,
}
