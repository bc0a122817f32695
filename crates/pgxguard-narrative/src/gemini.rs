//! Gemini REST client for clinical narrative generation.
//!
//! Endpoint: POST {base_url}/v1beta/models/{model}:generateContent
//!
//! The model is prompted for a strict four-field JSON object. Responses
//! are fence-stripped, parsed, and patched field-by-field from the
//! deterministic fallback so a partially valid reply still yields a
//! complete narrative. Transport errors, timeouts, and unparseable
//! output surface as `PgxError::Narrative`; the pipeline substitutes
//! the fallback and never propagates them.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use pgxguard_common::report::NarrativeExplanation;
use pgxguard_common::{PgxError, Result};

use crate::fallback::FallbackResolver;
use crate::{NarrativeContext, NarrativeGenerator};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Prodrug vs active-drug classification for prompt context.
/// Prodrugs need metabolic activation; active drugs are cleared by it.
fn drug_type(drug: &str) -> &'static str {
    match drug {
        "CODEINE" | "CLOPIDOGREL" | "AZATHIOPRINE" => "prodrug",
        "WARFARIN" | "SIMVASTATIN" | "FLUOROURACIL" => "active_drug",
        _ => "unknown",
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    fallback: FallbackResolver,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            fallback: FallbackResolver::new(),
        })
    }

    fn build_prompt(&self, ctx: &NarrativeContext) -> String {
        let drug_upper = ctx.drug.to_uppercase();
        let activity_score = ctx
            .activity_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Not calculated".to_string());

        format!(
            "You are a clinical pharmacogenomics expert writing explanations for licensed physicians.\n\
             \n\
             PATIENT PHARMACOGENOMIC DATA:\n\
             - Gene analyzed      : {gene}\n\
             - Diplotype          : {diplotype}\n\
             - Phenotype          : {phenotype} ({phenotype_definition})\n\
             - Metabolic Shift    : {risk_direction}\n\
             - Activity Score     : {activity_score}\n\
             - Drug               : {drug}\n\
             - Drug Type          : {drug_type}\n\
             - Risk Assessment    : {risk_label} (Severity: {severity})\n\
             - Recommended Action : {action}\n\
             - Detected Variants  : {variants}\n\
             \n\
             INSTRUCTIONS:\n\
             - Write for a physician audience using clinical terminology\n\
             - Mention the specific gene, diplotype, and variant rsIDs\n\
             - Explain WHY this phenotype causes this specific risk for this specific drug\n\
             - For prodrugs: explain activation pathway and what goes wrong\n\
             - For active drugs: explain clearance pathway and what goes wrong\n\
             - Keep each field concise but medically complete\n\
             - Do NOT include markdown, code fences, or backticks in your response\n\
             \n\
             Respond ONLY with this exact JSON structure and nothing else:\n\
             {{\n\
               \"summary\": \"2-3 sentence plain-language explanation of the risk for this patient\",\n\
               \"mechanism\": \"Detailed biological mechanism - mention enzyme, metabolic pathway, and effect on drug plasma levels\",\n\
               \"clinical_context\": \"Practical prescribing implications - what the clinician should do and why\",\n\
               \"references\": [\n\
                 \"CPIC guideline reference\",\n\
                 \"PharmGKB or PharmVar reference\",\n\
                 \"Key supporting clinical study\"\n\
               ]\n\
             }}",
            gene = ctx.gene,
            diplotype = ctx.diplotype,
            phenotype = ctx.phenotype,
            phenotype_definition = ctx.phenotype.definition(),
            risk_direction = ctx.phenotype.risk_direction(),
            activity_score = activity_score,
            drug = drug_upper,
            drug_type = drug_type(&drug_upper),
            risk_label = ctx.risk_label,
            severity = ctx.severity,
            action = ctx.action,
            variants = format_variants(ctx),
        )
    }
}

/// Render the gene-matching variants for the prompt, capped at four.
fn format_variants(ctx: &NarrativeContext) -> String {
    let gene_variants: Vec<String> = ctx
        .variants
        .iter()
        .filter(|v| v.gene == ctx.gene)
        .take(4)
        .map(|v| format!("{} ({}, {}, {})", v.rsid, v.star_allele, v.zygosity, v.effect))
        .collect();

    if gene_variants.is_empty() {
        "No variants detected (assumed wildtype)".to_string()
    } else {
        gene_variants.join(" | ")
    }
}

/// Strip markdown code fences the model sometimes wraps JSON in.
fn clean_response(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.split("```json").nth(1) {
        return rest.split("```").next().unwrap_or("").trim();
    }
    if trimmed.contains("```") {
        return trimmed.split("```").nth(1).unwrap_or("").trim();
    }
    trimmed
}

#[async_trait]
impl NarrativeGenerator for GeminiClient {
    #[instrument(skip(self, ctx), fields(gene = %ctx.gene, drug = %ctx.drug, phenotype = %ctx.phenotype))]
    async fn generate(&self, ctx: &NarrativeContext) -> Result<NarrativeExplanation> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": self.build_prompt(ctx) }] }],
            "generationConfig": {
                // Low temperature for consistent clinical output.
                "temperature": 0.3,
                "topP": 0.95,
                "maxOutputTokens": 1000,
            }
        });

        let resp = self.http.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(PgxError::Narrative(format!(
                "narrative service returned HTTP {}",
                resp.status()
            )));
        }

        let payload: Value = resp.json().await?;
        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| PgxError::Narrative("response contained no candidate text".into()))?;

        let cleaned = clean_response(text);
        let parsed: Value = serde_json::from_str(cleaned).map_err(|e| {
            warn!(error = %e, "narrative service returned non-JSON text");
            PgxError::Narrative(format!("non-JSON narrative payload: {e}"))
        })?;

        debug!("narrative response parsed, patching missing fields");
        Ok(self.fallback.patch(ctx, &parsed))
    }
}
