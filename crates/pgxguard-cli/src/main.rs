//! PGxGuard — Pharmacogenomic risk prediction from patient VCFs.
//! Entry point for the command-line binary.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pgxguard_core::{AnalysisRequest, Pipeline, ReferenceTables};
use pgxguard_narrative::fallback::FallbackResolver;
use pgxguard_narrative::gemini::GeminiClient;
use pgxguard_narrative::NarrativeGenerator;

#[derive(Debug, Parser)]
#[command(name = "pgxguard", about = "Predict drug-metabolism risk from a patient VCF")]
struct Args {
    /// Path to the patient VCF file.
    #[arg(long)]
    vcf: PathBuf,

    /// Drug to analyze; repeat for multiple drugs.
    #[arg(long = "drug", required = true)]
    drugs: Vec<String>,

    /// Patient identifier; auto-generated when omitted.
    #[arg(long)]
    patient_id: Option<String>,

    /// Path to pgxguard.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

fn build_generator(config: &config::Config) -> anyhow::Result<Arc<dyn NarrativeGenerator>> {
    match config.narrative.mode.as_str() {
        "gemini" => {
            let api_key = config.gemini_api_key();
            if api_key.is_empty() {
                warn!("narrative mode is 'gemini' but no API key found (set narrative.api_key or PGXGUARD_GEMINI_API_KEY); using deterministic fallback");
                return Ok(Arc::new(FallbackResolver::new()));
            }
            let client = GeminiClient::new(
                api_key,
                config.narrative.model.clone(),
                config.narrative.base_url.clone(),
                Duration::from_secs(config.narrative.timeout_secs),
            )?;
            Ok(Arc::new(client))
        }
        "fallback" => Ok(Arc::new(FallbackResolver::new())),
        other => anyhow::bail!("unknown narrative mode '{other}' (expected 'gemini' or 'fallback')"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = config::Config::load(args.config.as_deref())?;

    let tables = ReferenceTables::load(
        Path::new(&config.reference.variant_database),
        Path::new(&config.reference.diplotype_phenotype),
        Path::new(&config.reference.guidelines),
    )
    .context("loading reference tables")?;

    let narrative = build_generator(&config)?;
    let pipeline = Pipeline::new(Arc::new(tables), narrative);

    let vcf_text = std::fs::read_to_string(&args.vcf)
        .with_context(|| format!("reading VCF {}", args.vcf.display()))?;

    let patient_id = args.patient_id.unwrap_or_else(|| {
        let suffix: String = uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase();
        format!("PATIENT_{suffix}")
    });

    let request = AnalysisRequest {
        patient_id,
        vcf_text,
        drugs: args.drugs,
    };

    let reports = pipeline.run(&request).await;
    info!(reports = reports.len(), "analysis complete");

    let json = if args.pretty {
        serde_json::to_string_pretty(&reports)?
    } else {
        serde_json::to_string(&reports)?
    };

    match args.out {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
