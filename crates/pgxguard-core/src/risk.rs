//! Drug risk assessment from guideline tables.
//!
//! Unknown drugs and unmapped phenotypes resolve to explicit
//! low-confidence defaults — an unknown drug must never be silently
//! treated as safe. See ARCHITECTURE.md §2.5

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pgxguard_common::Phenotype;

use crate::reference::{GuidelineRule, GuidelineTable};

/// Clinical risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Safe,
    #[serde(rename = "Adjust Dosage")]
    AdjustDosage,
    Toxic,
    Ineffective,
    Unknown,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Safe => "Safe",
            RiskLabel::AdjustDosage => "Adjust Dosage",
            RiskLabel::Toxic => "Toxic",
            RiskLabel::Ineffective => "Ineffective",
            RiskLabel::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured verdict for one (drug, phenotype) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskVerdict {
    /// Normalized (uppercased, trimmed) drug name.
    pub drug: String,
    pub gene: String,
    pub cpic_ref: String,
    pub risk_label: RiskLabel,
    pub severity: String,
    pub confidence_score: f64,
    pub action: String,
    pub dose_adjustment: String,
    pub alternatives: Vec<String>,
    pub monitoring_required: bool,
}

pub struct RiskEngine<'a> {
    guidelines: &'a GuidelineTable,
}

impl<'a> RiskEngine<'a> {
    pub fn new(guidelines: &'a GuidelineTable) -> Self {
        Self { guidelines }
    }

    /// Gene the drug's guideline names, or `"Unknown"`.
    pub fn primary_gene(&self, drug: &str) -> String {
        self.guidelines
            .drug(&normalize_drug(drug))
            .and_then(|g| g.primary_gene.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn assess(&self, drug: &str, phenotype: Phenotype, gene: &str) -> RiskVerdict {
        let drug_upper = normalize_drug(drug);

        let Some(entry) = self.guidelines.drug(&drug_upper) else {
            warn!(drug = %drug_upper, "no guideline entry for drug, returning unknown verdict");
            return unknown_drug_verdict(drug_upper);
        };

        let rule = entry
            .rules
            .get(phenotype.code())
            .or_else(|| entry.rules.get(Phenotype::Unknown.code()));

        let default_rule = default_rule();
        let rule = match rule {
            Some(r) => r,
            None => {
                debug!(drug = %drug_upper, phenotype = %phenotype, "no rule for phenotype, using default");
                &default_rule
            }
        };

        RiskVerdict {
            drug: drug_upper,
            gene: entry.primary_gene.clone().unwrap_or_else(|| gene.to_string()),
            cpic_ref: entry.cpic_ref.clone().unwrap_or_default(),
            risk_label: rule.risk_label,
            severity: rule.severity.clone(),
            confidence_score: rule.confidence,
            action: rule.action.clone(),
            dose_adjustment: rule
                .dose_adjustment
                .clone()
                .unwrap_or_else(|| "Consult clinician".to_string()),
            alternatives: rule.alternatives.clone(),
            monitoring_required: rule.monitoring,
        }
    }
}

fn normalize_drug(drug: &str) -> String {
    drug.trim().to_uppercase()
}

/// Verdict for a drug with no guideline entry at all.
fn unknown_drug_verdict(drug_upper: String) -> RiskVerdict {
    RiskVerdict {
        drug: drug_upper,
        gene: "Unknown".to_string(),
        cpic_ref: "No CPIC guideline available".to_string(),
        risk_label: RiskLabel::Unknown,
        severity: "low".to_string(),
        confidence_score: 0.30,
        action: "No pharmacogenomic guideline available for this drug".to_string(),
        dose_adjustment: "Standard clinical judgment".to_string(),
        alternatives: Vec::new(),
        monitoring_required: true,
    }
}

/// Rule applied when a drug's table has neither the phenotype nor an
/// `Unknown` entry.
fn default_rule() -> GuidelineRule {
    GuidelineRule {
        risk_label: RiskLabel::Unknown,
        severity: "low".to_string(),
        confidence: 0.40,
        action: "Insufficient data".to_string(),
        dose_adjustment: Some("Consult pharmacist".to_string()),
        alternatives: Vec::new(),
        monitoring: true,
    }
}
