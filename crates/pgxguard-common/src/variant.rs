//! Zygosity and functional-effect vocabularies shared by the parser,
//! enricher, and predictor. See ARCHITECTURE.md §2.1–2.2

use serde::{Deserialize, Serialize};

/// Zygosity classification derived from a two-allele genotype string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zygosity {
    /// Both copies carry the same non-reference allele (e.g. 1/1).
    Homozygous,
    /// Both copies are reference (0/0).
    HomozygousRef,
    /// One reference and one alternate copy (e.g. 0/1).
    Heterozygous,
    /// Two distinct non-reference alleles (e.g. 1/2).
    CompoundHeterozygous,
    /// Anything that is not exactly two allele tokens.
    Unknown,
}

impl Zygosity {
    /// Classify a raw GT token (`0/1`, `1|1`, `./.`, …).
    ///
    /// Exactly two allele tokens are expected; anything else is
    /// `Unknown`. Phased (`|`) and unphased (`/`) genotypes are
    /// treated identically.
    pub fn from_genotype(gt: &str) -> Zygosity {
        let normalized = gt.replace('|', "/");
        let alleles: Vec<&str> = normalized.split('/').collect();
        if alleles.len() != 2 {
            return Zygosity::Unknown;
        }
        let (a, b) = (alleles[0], alleles[1]);
        if a == b {
            if a == "0" {
                Zygosity::HomozygousRef
            } else {
                Zygosity::Homozygous
            }
        } else if a == "0" || b == "0" {
            Zygosity::Heterozygous
        } else {
            Zygosity::CompoundHeterozygous
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Zygosity::Homozygous => "homozygous",
            Zygosity::HomozygousRef => "homozygous_ref",
            Zygosity::Heterozygous => "heterozygous",
            Zygosity::CompoundHeterozygous => "compound_heterozygous",
            Zygosity::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Zygosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Functional effect of a star allele on enzyme activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    LossOfFunction,
    DecreasedFunction,
    NormalFunction,
    IncreasedFunction,
    /// Absent or unrecognized annotation in the knowledge base.
    #[serde(other)]
    Unknown,
}

impl Effect {
    /// Per-allele activity contribution used by the score-based
    /// phenotype predictor. An unannotated effect counts as normal
    /// activity: assuming pathogenicity without evidence would
    /// overstate risk.
    pub fn activity_value(&self) -> f64 {
        match self {
            Effect::LossOfFunction => 0.0,
            Effect::DecreasedFunction => 0.5,
            Effect::NormalFunction => 1.0,
            Effect::IncreasedFunction => 1.5,
            Effect::Unknown => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::LossOfFunction => "loss_of_function",
            Effect::DecreasedFunction => "decreased_function",
            Effect::NormalFunction => "normal_function",
            Effect::IncreasedFunction => "increased_function",
            Effect::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
