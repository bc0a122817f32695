//! Deterministic narrative fallback.
//!
//! A curated table covers the highest-confidence (gene, phenotype,
//! drug) combinations; everything else gets a templated narrative.
//! The same resolver patches structurally incomplete service
//! responses field by field, so the pipeline output always carries a
//! complete explanation.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use pgxguard_common::report::NarrativeExplanation;
use pgxguard_common::{Phenotype, Result};

use crate::{NarrativeContext, NarrativeGenerator};

/// Pre-written narrative fields for one curated combination.
struct CuratedEntry {
    summary: &'static str,
    mechanism: &'static str,
    clinical_context: &'static str,
    references: &'static [&'static str],
}

/// Curated table keyed by (gene, phenotype, uppercase drug).
/// Extend as further guideline combinations are reviewed.
fn build_curated_table() -> HashMap<(&'static str, Phenotype, &'static str), CuratedEntry> {
    let mut m = HashMap::new();
    m.insert(
        ("CYP2D6", Phenotype::PM, "CODEINE"),
        CuratedEntry {
            summary: "This patient carries the {diplotype} CYP2D6 diplotype, classifying them as a Poor Metabolizer. Codeine is contraindicated due to the inability to convert it to morphine, with risk of respiratory depression from toxic metabolite accumulation.",
            mechanism: "CYP2D6 catalyzes the O-demethylation of codeine to morphine. The *4 allele introduces a splicing defect resulting in a non-functional enzyme. In *4/*4 homozygotes, this conversion is completely absent, causing codeine accumulation and preventing analgesic effect while increasing toxic metabolite burden.",
            clinical_context: "Prescribing codeine to this patient is contraindicated per CPIC guidelines. Switch to morphine or hydromorphone, which are not CYP2D6-dependent. Document the genetic finding in the patient's chart.",
            references: &[
                "CPIC Guideline for Codeine and CYP2D6 (2022)",
                "PharmGKB: PA166104996",
                "Crews et al., Clin Pharmacol Ther 2014",
            ],
        },
    );
    m.insert(
        ("CYP2D6", Phenotype::URM, "CODEINE"),
        CuratedEntry {
            summary: "Patient is a CYP2D6 Ultrarapid Metabolizer ({diplotype}). Codeine is rapidly converted to morphine at dangerously high rates, risking fatal respiratory depression.",
            mechanism: "Gene duplication or multiplication of functional CYP2D6 alleles leads to greatly amplified enzyme activity. Codeine is metabolized to morphine far faster than normal, flooding the system with active opioid.",
            clinical_context: "Codeine is contraindicated in URM patients. Even standard doses can cause life-threatening opioid toxicity. Use non-opioid alternatives or opioids not metabolized by CYP2D6.",
            references: &[
                "CPIC Guideline for Codeine and CYP2D6 (2022)",
                "FDA Drug Safety Communication on Codeine",
            ],
        },
    );
    m.insert(
        ("CYP2C19", Phenotype::PM, "CLOPIDOGREL"),
        CuratedEntry {
            summary: "This patient is a CYP2C19 Poor Metabolizer ({diplotype}). Clopidogrel cannot be converted to its active form, rendering it ineffective as an antiplatelet agent.",
            mechanism: "CYP2C19 activates clopidogrel via two-step oxidation to an active thiol metabolite that irreversibly inhibits the P2Y12 platelet receptor. In PM patients, this activation pathway is blocked, resulting in no platelet inhibition.",
            clinical_context: "Switch to prasugrel or ticagrelor, which do not require CYP2C19 activation. These alternatives provide reliable antiplatelet effect regardless of CYP2C19 status.",
            references: &[
                "CPIC Guideline for Clopidogrel and CYP2C19 (2022)",
                "PharmGKB: PA166104999",
            ],
        },
    );
    m.insert(
        ("CYP2C9", Phenotype::PM, "WARFARIN"),
        CuratedEntry {
            summary: "Patient is a CYP2C9 Poor Metabolizer ({diplotype}). Warfarin clearance is severely reduced, causing drug accumulation and elevated bleeding risk at standard doses.",
            mechanism: "CYP2C9 is the primary enzyme responsible for S-warfarin hydroxylation and clearance. Loss-of-function alleles reduce enzyme activity, prolonging warfarin half-life and increasing anticoagulant effect at standard doses.",
            clinical_context: "Reduce initial warfarin dose by 50-75%. Increase INR monitoring frequency during initiation phase. Consider using a pharmacogenomic dosing algorithm.",
            references: &[
                "CPIC Guideline for Warfarin (2017)",
                "PharmGKB: PA166104979",
                "IWPC Warfarin Dosing Algorithm",
            ],
        },
    );
    m.insert(
        ("SLCO1B1", Phenotype::PM, "SIMVASTATIN"),
        CuratedEntry {
            summary: "Patient has reduced SLCO1B1 transporter function ({diplotype}), impairing hepatic uptake of simvastatin and raising plasma drug levels with high myopathy risk.",
            mechanism: "SLCO1B1 encodes the OATP1B1 hepatic uptake transporter. The *5 variant reduces transporter activity, causing simvastatin to remain in systemic circulation at elevated concentrations, increasing skeletal muscle exposure and toxicity risk.",
            clinical_context: "Avoid high-dose simvastatin. Switch to pravastatin or rosuvastatin which are less dependent on SLCO1B1 transport. If simvastatin is continued, cap at 20mg/day and monitor for muscle symptoms.",
            references: &[
                "CPIC Guideline for Simvastatin and SLCO1B1 (2022)",
                "PharmGKB: PA166105003",
            ],
        },
    );
    m.insert(
        ("TPMT", Phenotype::PM, "AZATHIOPRINE"),
        CuratedEntry {
            summary: "Patient is a TPMT Poor Metabolizer ({diplotype}). Azathioprine cannot be safely metabolized, causing life-threatening myelosuppression at standard doses.",
            mechanism: "TPMT inactivates thiopurine drugs by S-methylation. In PM patients, lack of TPMT activity causes accumulation of cytotoxic 6-thioguanine nucleotides in hematopoietic cells, leading to severe bone marrow suppression.",
            clinical_context: "Azathioprine is contraindicated at standard doses. If thiopurine therapy is necessary, reduce dose to 10% of standard and monitor CBC weekly. Consider switching to mycophenolate mofetil.",
            references: &[
                "CPIC Guideline for Thiopurines and TPMT (2022)",
                "PharmGKB: PA166104984",
            ],
        },
    );
    m.insert(
        ("DPYD", Phenotype::PM, "FLUOROURACIL"),
        CuratedEntry {
            summary: "Patient is a DPYD Poor Metabolizer ({diplotype}). Fluorouracil cannot be adequately catabolized, resulting in severe and potentially fatal drug toxicity.",
            mechanism: "DPYD (dihydropyrimidine dehydrogenase) is responsible for >80% of fluorouracil catabolism. Loss-of-function variants cause fluorouracil accumulation, leading to severe gastrointestinal, hematological, and neurological toxicity.",
            clinical_context: "Fluorouracil is contraindicated in DPYD PM patients. If fluoropyrimidine therapy is unavoidable, reduce dose by 50% minimum under specialist supervision with close toxicity monitoring.",
            references: &[
                "CPIC Guideline for Fluoropyrimidines and DPYD (2023)",
                "PharmGKB: PA166109603",
            ],
        },
    );
    m
}

/// Rule-based narrative resolver. Deterministic for identical inputs.
pub struct FallbackResolver {
    curated: HashMap<(&'static str, Phenotype, &'static str), CuratedEntry>,
}

impl FallbackResolver {
    pub fn new() -> Self {
        Self { curated: build_curated_table() }
    }

    /// Produce a complete narrative for the context.
    pub fn resolve(&self, ctx: &NarrativeContext) -> NarrativeExplanation {
        let drug_upper = ctx.drug.to_uppercase();
        let key = (ctx.gene.as_str(), ctx.phenotype, drug_upper.as_str());

        if let Some(entry) = self.curated.get(&key) {
            return NarrativeExplanation {
                summary: entry.summary.replace("{diplotype}", &ctx.diplotype),
                mechanism: entry.mechanism.to_string(),
                clinical_context: entry.clinical_context.to_string(),
                references: entry.references.iter().map(|r| r.to_string()).collect(),
            };
        }

        // Generic template for any combination outside the curated set.
        NarrativeExplanation {
            summary: format!(
                "Patient has {} {} diplotype ({} phenotype), resulting in {} risk for {}. {}",
                ctx.gene, ctx.diplotype, ctx.phenotype, ctx.risk_label, drug_upper, ctx.action
            ),
            mechanism: format!(
                "{} enzyme activity is altered by the {} diplotype. This directly affects the \
                 metabolism of {}, changing its plasma concentration and clinical effect.",
                ctx.gene, ctx.diplotype, drug_upper
            ),
            clinical_context: ctx.action.clone(),
            references: vec![
                "CPIC Guidelines — cpicpgx.org".to_string(),
                "PharmGKB — pharmgkb.org".to_string(),
                "PharmVar — pharmvar.org".to_string(),
            ],
        }
    }

    /// Repair a structurally incomplete service response.
    ///
    /// Each required field is filled individually from the fallback
    /// when missing or empty; `references` is replaced wholesale if it
    /// is not a list of strings.
    pub fn patch(&self, ctx: &NarrativeContext, raw: &Value) -> NarrativeExplanation {
        let fallback = self.resolve(ctx);

        let pick = |key: &str, fb: &str| -> String {
            match raw.get(key).and_then(Value::as_str) {
                Some(s) if !s.trim().is_empty() => s.to_string(),
                _ => fb.to_string(),
            }
        };

        let references = match raw.get("references").and_then(Value::as_array) {
            Some(items) => {
                let refs: Vec<String> = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect();
                if refs.is_empty() { fallback.references.clone() } else { refs }
            }
            None => fallback.references.clone(),
        };

        NarrativeExplanation {
            summary: pick("summary", &fallback.summary),
            mechanism: pick("mechanism", &fallback.mechanism),
            clinical_context: pick("clinical_context", &fallback.clinical_context),
            references,
        }
    }
}

impl Default for FallbackResolver {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl NarrativeGenerator for FallbackResolver {
    async fn generate(&self, ctx: &NarrativeContext) -> Result<NarrativeExplanation> {
        Ok(self.resolve(ctx))
    }
}
