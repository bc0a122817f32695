//! End-to-end analysis pipeline.
//!
//! Orchestrates the full flow for one request:
//!   1. Extract variant records from VCF text
//!   2. Enrich against the variant knowledge base
//!   3. Per selected drug: diplotype call → phenotype prediction →
//!      risk verdict → clinical narrative
//!   4. Assemble the per-drug report with quality metrics
//!
//! The pipeline is non-destructive: narrative failures are logged and
//! replaced by the deterministic fallback, never surfaced to the
//! caller. Per-drug analyses share the enriched-variant set but are
//! otherwise independent.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use pgxguard_common::report::{
    ClinicalRecommendation, DetectedVariant, DrugReport, PharmacogenomicProfile, QualityMetrics,
    RiskAssessment,
};
use pgxguard_narrative::fallback::FallbackResolver;
use pgxguard_narrative::{NarrativeContext, NarrativeGenerator, VariantSummary};

use crate::diplotype::DiplotypeCaller;
use crate::enrich::{EnrichedVariant, VariantEnricher};
use crate::predictor::PhenotypePredictor;
use crate::reference::ReferenceTables;
use crate::risk::RiskEngine;
use crate::vcf::VcfParser;

/// One analysis request: a patient's VCF text plus selected drugs.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub patient_id: String,
    pub vcf_text: String,
    pub drugs: Vec<String>,
}

pub struct Pipeline {
    tables: Arc<ReferenceTables>,
    narrative: Arc<dyn NarrativeGenerator>,
    fallback: FallbackResolver,
}

impl Pipeline {
    pub fn new(tables: Arc<ReferenceTables>, narrative: Arc<dyn NarrativeGenerator>) -> Self {
        Self { tables, narrative, fallback: FallbackResolver::new() }
    }

    /// Run the pipeline, producing one report per requested drug.
    #[instrument(skip(self, request), fields(patient_id = %request.patient_id, drugs = request.drugs.len()))]
    pub async fn run(&self, request: &AnalysisRequest) -> Vec<DrugReport> {
        let parser = VcfParser::new();
        let (records, quality) = parser.parse(&request.vcf_text);
        info!(
            parsed = quality.parsed_lines,
            skipped = quality.skipped_lines,
            "VCF extraction complete"
        );

        let enricher = VariantEnricher::new(&self.tables.knowledge_base);
        let enriched = enricher.enrich(&records);
        info!(enriched = enriched.len(), "variant enrichment complete");

        let mut reports = Vec::with_capacity(request.drugs.len());
        for drug in &request.drugs {
            reports.push(self.analyze_drug(request, drug, &records, &enriched).await);
        }
        reports
    }

    #[instrument(skip(self, request, records, enriched), fields(drug = %drug))]
    async fn analyze_drug(
        &self,
        request: &AnalysisRequest,
        drug: &str,
        records: &[crate::vcf::VariantRecord],
        enriched: &[EnrichedVariant],
    ) -> DrugReport {
        let engine = RiskEngine::new(&self.tables.guidelines);
        let primary_gene = engine.primary_gene(drug);

        let caller = DiplotypeCaller::new(&self.tables.diplotype_map);
        let call = caller.call(enriched, &primary_gene);

        let prediction =
            PhenotypePredictor::predict(&primary_gene, &call.diplotype, call.phenotype, enriched);

        let verdict = engine.assess(drug, prediction.phenotype, &primary_gene);

        let ctx = NarrativeContext {
            gene: primary_gene.clone(),
            diplotype: call.diplotype.clone(),
            phenotype: prediction.phenotype,
            drug: verdict.drug.clone(),
            risk_label: verdict.risk_label.to_string(),
            severity: verdict.severity.clone(),
            action: verdict.action.clone(),
            activity_score: prediction.activity_score,
            variants: enriched
                .iter()
                .map(|v| VariantSummary {
                    rsid: v.rsid.clone(),
                    gene: v.gene.clone(),
                    star_allele: v.star_allele.clone(),
                    zygosity: v.zygosity,
                    effect: v.effect,
                })
                .collect(),
        };

        let explanation = match self.narrative.generate(&ctx).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "narrative generation failed, using deterministic fallback");
                self.fallback.resolve(&ctx)
            }
        };

        let gene_variants: Vec<&EnrichedVariant> =
            enriched.iter().filter(|v| v.gene == primary_gene).collect();

        let completeness = if enriched.is_empty() {
            0.0
        } else {
            round2(gene_variants.len() as f64 / enriched.len() as f64)
        };

        let genes_analyzed: BTreeSet<String> =
            enriched.iter().map(|v| v.gene.clone()).collect();

        DrugReport {
            patient_id: request.patient_id.clone(),
            drug: verdict.drug.clone(),
            timestamp: Utc::now(),
            risk_assessment: RiskAssessment {
                risk_label: verdict.risk_label.to_string(),
                confidence_score: verdict.confidence_score,
                severity: verdict.severity.clone(),
            },
            pharmacogenomic_profile: PharmacogenomicProfile {
                primary_gene,
                diplotype: call.diplotype,
                phenotype: prediction.phenotype,
                detected_variants: gene_variants
                    .iter()
                    .map(|v| DetectedVariant {
                        rsid: v.rsid.clone(),
                        gene: v.gene.clone(),
                        star_allele: v.star_allele.clone(),
                        zygosity: v.zygosity,
                        clinical_significance: v.clinical_significance.clone(),
                    })
                    .collect(),
            },
            clinical_recommendation: ClinicalRecommendation {
                action: verdict.action,
                dose_adjustment: verdict.dose_adjustment,
                alternative_drugs: verdict.alternatives,
                monitoring_required: verdict.monitoring_required,
                cpic_guideline_ref: verdict.cpic_ref,
            },
            explanation,
            quality_metrics: QualityMetrics {
                vcf_parsing_success: !records.is_empty(),
                variants_detected: enriched.len(),
                genes_analyzed: genes_analyzed.into_iter().collect(),
                annotation_completeness: completeness,
            },
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
