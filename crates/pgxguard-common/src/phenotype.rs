//! Metabolizer phenotype vocabulary and activity-score banding.
//! Implements the classification defined in ARCHITECTURE.md §2.4

use serde::{Deserialize, Serialize};

/// CPIC-style metabolizer phenotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phenotype {
    /// Poor Metabolizer
    PM,
    /// Intermediate Metabolizer
    IM,
    /// Normal Metabolizer
    NM,
    /// Rapid Metabolizer
    RM,
    /// Ultrarapid Metabolizer
    URM,
    /// Could not be determined from available data
    Unknown,
}

/// Whether a phenotype shifts drug exposure up or down.
/// Used as prompt context for the narrative service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDirection {
    ReducedClearance,
    Normal,
    IncreasedClearance,
    Unknown,
}

impl RiskDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskDirection::ReducedClearance => "reduced_clearance",
            RiskDirection::Normal => "normal",
            RiskDirection::IncreasedClearance => "increased_clearance",
            RiskDirection::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RiskDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Phenotype {
    /// Short code used as a key in reference tables.
    pub fn code(&self) -> &'static str {
        match self {
            Phenotype::PM => "PM",
            Phenotype::IM => "IM",
            Phenotype::NM => "NM",
            Phenotype::RM => "RM",
            Phenotype::URM => "URM",
            Phenotype::Unknown => "Unknown",
        }
    }

    /// Parse a table key back into a phenotype. Unrecognized codes map
    /// to `Unknown` so a malformed reference table degrades rather
    /// than fails.
    pub fn parse_code(code: &str) -> Phenotype {
        match code {
            "PM" => Phenotype::PM,
            "IM" => Phenotype::IM,
            "NM" => Phenotype::NM,
            "RM" => Phenotype::RM,
            "URM" => Phenotype::URM,
            _ => Phenotype::Unknown,
        }
    }

    /// Fixed clinical definition text.
    pub fn definition(&self) -> &'static str {
        match self {
            Phenotype::PM => "Poor Metabolizer — little to no enzyme activity",
            Phenotype::IM => "Intermediate Metabolizer — reduced enzyme activity",
            Phenotype::NM => "Normal Metabolizer — standard enzyme activity",
            Phenotype::RM => "Rapid Metabolizer — increased enzyme activity",
            Phenotype::URM => "Ultrarapid Metabolizer — greatly increased enzyme activity",
            Phenotype::Unknown => "Phenotype could not be determined from available data",
        }
    }

    /// Band a total activity score into a phenotype.
    ///
    /// The bands partition `[0, ∞)`: exactly 0 → PM, (0, 1] → IM,
    /// (1, 2] → NM, (2, 3] → RM, above 3 → URM. Scores are
    /// non-negative by construction (all effect contributions are ≥ 0).
    pub fn from_activity_score(score: f64) -> Phenotype {
        if score <= 0.0 {
            Phenotype::PM
        } else if score <= 1.0 {
            Phenotype::IM
        } else if score <= 2.0 {
            Phenotype::NM
        } else if score <= 3.0 {
            Phenotype::RM
        } else {
            Phenotype::URM
        }
    }

    /// Direction of the metabolic shift relative to normal.
    pub fn risk_direction(&self) -> RiskDirection {
        match self {
            Phenotype::PM | Phenotype::IM => RiskDirection::ReducedClearance,
            Phenotype::NM => RiskDirection::Normal,
            Phenotype::RM | Phenotype::URM => RiskDirection::IncreasedClearance,
            Phenotype::Unknown => RiskDirection::Unknown,
        }
    }

    /// Anything other than a Normal Metabolizer warrants clinical attention.
    pub fn is_actionable(&self) -> bool {
        *self != Phenotype::NM
    }
}

impl std::fmt::Display for Phenotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
