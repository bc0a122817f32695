//! Activity-score phenotype prediction.
//!
//! Two strategies, mutually exclusive per call: pass the diplotype
//! lookup result through when it resolved, otherwise sum per-variant
//! activity contributions and band the total.
//! See ARCHITECTURE.md §2.4

use serde::{Deserialize, Serialize};
use tracing::debug;

use pgxguard_common::{Phenotype, Zygosity};

use crate::enrich::EnrichedVariant;

/// How the phenotype was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    DiplotypeLookup,
    ActivityScore,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhenotypePrediction {
    pub gene: String,
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub phenotype_definition: String,
    pub method: PredictionMethod,
    /// Set only for score-based predictions, rounded to 2 decimals.
    pub activity_score: Option<f64>,
    pub is_actionable: bool,
}

pub struct PhenotypePredictor;

impl PhenotypePredictor {
    /// Resolve the final phenotype for `gene`.
    ///
    /// `lookup_phenotype` comes from the diplotype caller; anything
    /// other than `Unknown` is passed through without recomputation.
    pub fn predict(
        gene: &str,
        diplotype: &str,
        lookup_phenotype: Phenotype,
        enriched: &[EnrichedVariant],
    ) -> PhenotypePrediction {
        if lookup_phenotype != Phenotype::Unknown {
            return build(gene, diplotype, lookup_phenotype, PredictionMethod::DiplotypeLookup, None);
        }

        let (phenotype, score) = score_based(gene, enriched);
        debug!(gene, score, phenotype = %phenotype, "phenotype predicted from activity score");
        build(gene, diplotype, phenotype, PredictionMethod::ActivityScore, Some(score))
    }
}

/// Sum activity contributions across the gene's variants and band the
/// total.
///
/// A homozygous variant contributes twice its allele value. A
/// heterozygous or compound-heterozygous variant contributes its
/// allele value plus a flat 1.0 for the assumed normal-activity second
/// copy — deliberately asymmetric with the homozygous case, which has
/// no normal copy to credit. Any other zygosity contributes the allele
/// value alone.
fn score_based(gene: &str, enriched: &[EnrichedVariant]) -> (Phenotype, f64) {
    let gene_variants: Vec<&EnrichedVariant> =
        enriched.iter().filter(|v| v.gene == gene).collect();

    if gene_variants.is_empty() {
        // Two normal-activity copies: fully wildtype.
        return (Phenotype::NM, 2.0);
    }

    let mut total = 0.0;
    for v in &gene_variants {
        let base = v.effect.activity_value();
        total += match v.zygosity {
            Zygosity::Homozygous => base * 2.0,
            Zygosity::Heterozygous | Zygosity::CompoundHeterozygous => base + 1.0,
            _ => base,
        };
    }

    (Phenotype::from_activity_score(total), round2(total))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn build(
    gene: &str,
    diplotype: &str,
    phenotype: Phenotype,
    method: PredictionMethod,
    activity_score: Option<f64>,
) -> PhenotypePrediction {
    PhenotypePrediction {
        gene: gene.to_string(),
        diplotype: diplotype.to_string(),
        phenotype,
        phenotype_definition: phenotype.definition().to_string(),
        method,
        activity_score,
        is_actionable: phenotype.is_actionable(),
    }
}
