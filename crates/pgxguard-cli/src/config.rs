//! Configuration loading for PGxGuard.
//! Reads pgxguard.toml from the current directory or the path in the
//! PGXGUARD_CONFIG env var. A missing file yields full defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use pgxguard_common::{PgxError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub narrative: NarrativeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default = "default_variant_db")]
    pub variant_database: String,
    #[serde(default = "default_diplotype_map")]
    pub diplotype_phenotype: String,
    #[serde(default = "default_guidelines")]
    pub guidelines: String,
}

fn default_variant_db() -> String { "data/variant_database.json".to_string() }
fn default_diplotype_map() -> String { "data/diplotype_phenotype.json".to_string() }
fn default_guidelines() -> String { "data/cpic_guidelines.json".to_string() }

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            variant_database: default_variant_db(),
            diplotype_phenotype: default_diplotype_map(),
            guidelines: default_guidelines(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// "fallback" (deterministic, offline) or "gemini".
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Override for the Gemini API base URL (testing).
    pub base_url: Option<String>,
    /// API key; PGXGUARD_GEMINI_API_KEY env var takes precedence.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_mode() -> String { "fallback".to_string() }
fn default_model() -> String { "gemini-1.5-flash".to_string() }
fn default_timeout_secs() -> u64 { 30 }

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            model: default_model(),
            base_url: None,
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load from an explicit path, the PGXGUARD_CONFIG env var, or
    /// ./pgxguard.toml, in that order. Absent file → defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(|p| p.to_path_buf())
            .or_else(|| std::env::var("PGXGUARD_CONFIG").ok().map(Into::into))
            .unwrap_or_else(|| "pgxguard.toml".into());

        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)?;
        toml::from_str(&text)
            .map_err(|e| PgxError::Config(format!("{}: {e}", path.display())))
    }

    /// Resolved Gemini API key (env var wins over the config file).
    pub fn gemini_api_key(&self) -> String {
        std::env::var("PGXGUARD_GEMINI_API_KEY").unwrap_or_else(|_| self.narrative.api_key.clone())
    }
}
