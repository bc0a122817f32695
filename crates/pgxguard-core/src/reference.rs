//! Reference data snapshots.
//!
//! Three JSON tables are loaded once at process start and treated as
//! immutable for the process lifetime; every resolver receives them by
//! reference. "Key not found" is a designed branch everywhere, never
//! an error path. See ARCHITECTURE.md §2.6

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use pgxguard_common::{Effect, PgxError, Phenotype, Result};

use crate::risk::RiskLabel;

// ── Variant knowledge base ────────────────────────────────────────────────────

/// One knowledge-base entry for an rsID.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VariantAnnotation {
    pub gene: Option<String>,
    pub star_allele: Option<String>,
    pub effect: Option<Effect>,
    pub clinical_significance: Option<String>,
}

/// rsID → annotation, keyed by lowercase rsID.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct VariantKnowledgeBase {
    entries: HashMap<String, VariantAnnotation>,
}

impl VariantKnowledgeBase {
    /// Case-insensitive lookup first, then exact, matching how the
    /// table is keyed in the wild (lowercase rsIDs with occasional
    /// verbatim keys).
    pub fn get(&self, rsid: &str) -> Option<&VariantAnnotation> {
        self.entries
            .get(&rsid.to_lowercase())
            .or_else(|| self.entries.get(rsid))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PgxError::Reference(format!("variant knowledge base: {e}")))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }
}

// ── Diplotype → phenotype map ─────────────────────────────────────────────────

/// Per-gene diplotype lookup table. The source JSON is flat: diplotype
/// keys sit alongside the two `default_*` keys, so those are split out
/// here and the rest flattens into the diplotype map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneDiplotypeTable {
    #[serde(default)]
    pub default_no_variant: Option<String>,
    #[serde(default)]
    pub default_phenotype: Option<String>,
    #[serde(flatten)]
    pub diplotypes: HashMap<String, String>,
}

impl GeneDiplotypeTable {
    pub fn phenotype_for(&self, diplotype: &str) -> Option<Phenotype> {
        self.diplotypes.get(diplotype).map(|code| Phenotype::parse_code(code))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DiplotypePhenotypeMap {
    genes: HashMap<String, GeneDiplotypeTable>,
}

impl DiplotypePhenotypeMap {
    pub fn gene(&self, gene: &str) -> Option<&GeneDiplotypeTable> {
        self.genes.get(gene)
    }

    pub fn from_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PgxError::Reference(format!("diplotype-phenotype map: {e}")))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }
}

// ── Drug guideline table ──────────────────────────────────────────────────────

/// One phenotype rule inside a drug guideline.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GuidelineRule {
    pub risk_label: RiskLabel,
    pub severity: String,
    pub confidence: f64,
    pub action: String,
    #[serde(default)]
    pub dose_adjustment: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub monitoring: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrugGuideline {
    pub primary_gene: Option<String>,
    pub cpic_ref: Option<String>,
    #[serde(default)]
    pub rules: HashMap<String, GuidelineRule>,
}

/// Uppercase drug name → guideline entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct GuidelineTable {
    drugs: HashMap<String, DrugGuideline>,
}

impl GuidelineTable {
    pub fn drug(&self, drug_upper: &str) -> Option<&DrugGuideline> {
        self.drugs.get(drug_upper)
    }

    pub fn from_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PgxError::Reference(format!("guideline table: {e}")))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }
}

// ── Bundle ────────────────────────────────────────────────────────────────────

/// All reference tables, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub knowledge_base: VariantKnowledgeBase,
    pub diplotype_map: DiplotypePhenotypeMap,
    pub guidelines: GuidelineTable,
}

impl ReferenceTables {
    pub fn load(
        knowledge_base: &Path,
        diplotype_map: &Path,
        guidelines: &Path,
    ) -> Result<Self> {
        let tables = Self {
            knowledge_base: VariantKnowledgeBase::from_path(knowledge_base)?,
            diplotype_map: DiplotypePhenotypeMap::from_path(diplotype_map)?,
            guidelines: GuidelineTable::from_path(guidelines)?,
        };
        info!(
            variants = tables.knowledge_base.len(),
            "reference tables loaded"
        );
        Ok(tables)
    }
}
