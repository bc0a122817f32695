//! Knowledge-base enrichment of extracted variants.
//!
//! Each record is looked up by rsID; reference fields win, in-record
//! INFO annotations fill the gaps. A record that yields no gene from
//! either source cannot contribute to any gene-specific analysis and
//! is dropped. See ARCHITECTURE.md §2.2

use serde::{Deserialize, Serialize};
use tracing::debug;

use pgxguard_common::{Effect, Zygosity};

use crate::reference::VariantKnowledgeBase;
use crate::vcf::VariantRecord;

/// Where the enrichment fields came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentSource {
    /// Matched an entry in the variant knowledge base.
    Database,
    /// GENE/STAR INFO tags supplied directly in the VCF.
    VcfAnnotation,
}

/// A variant record plus resolved annotations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedVariant {
    pub rsid: String,
    pub gene: String,
    pub star_allele: String,
    pub zygosity: Zygosity,
    pub effect: Effect,
    pub clinical_significance: String,
    pub chrom: String,
    pub pos: u64,
    pub reference: String,
    pub alternate: String,
    pub genotype: Option<String>,
    pub source: EnrichmentSource,
}

pub struct VariantEnricher<'a> {
    kb: &'a VariantKnowledgeBase,
}

impl<'a> VariantEnricher<'a> {
    pub fn new(kb: &'a VariantKnowledgeBase) -> Self {
        Self { kb }
    }

    /// Enrich records in input order, dropping the unresolvable ones.
    pub fn enrich(&self, records: &[VariantRecord]) -> Vec<EnrichedVariant> {
        records.iter().filter_map(|r| self.enrich_one(r)).collect()
    }

    fn enrich_one(&self, record: &VariantRecord) -> Option<EnrichedVariant> {
        let zygosity = record.zygosity.unwrap_or(Zygosity::Unknown);

        if let Some(entry) = self.kb.get(&record.rsid) {
            return Some(EnrichedVariant {
                rsid: record.rsid.clone(),
                gene: entry
                    .gene
                    .clone()
                    .or_else(|| record.gene.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                star_allele: entry
                    .star_allele
                    .clone()
                    .or_else(|| record.star_allele.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                zygosity,
                effect: entry.effect.unwrap_or(Effect::Unknown),
                clinical_significance: entry.clinical_significance.clone().unwrap_or_default(),
                chrom: record.chrom.clone(),
                pos: record.pos,
                reference: record.reference.clone(),
                alternate: record.alternate.clone(),
                genotype: record.genotype.clone(),
                source: EnrichmentSource::Database,
            });
        }

        // No knowledge-base hit: a record annotated with both GENE and
        // STAR tags still carries enough to analyze.
        if let (Some(gene), Some(star_allele)) = (&record.gene, &record.star_allele) {
            return Some(EnrichedVariant {
                rsid: record.rsid.clone(),
                gene: gene.clone(),
                star_allele: star_allele.clone(),
                zygosity,
                effect: Effect::Unknown,
                clinical_significance: "Annotated in VCF".to_string(),
                chrom: record.chrom.clone(),
                pos: record.pos,
                reference: record.reference.clone(),
                alternate: record.alternate.clone(),
                genotype: record.genotype.clone(),
                source: EnrichmentSource::VcfAnnotation,
            });
        }

        debug!(rsid = %record.rsid, "variant dropped: no gene from database or VCF annotation");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rsid: &str, gene: Option<&str>, star: Option<&str>) -> VariantRecord {
        VariantRecord {
            chrom: "chr22".into(),
            pos: 42130692,
            rsid: rsid.into(),
            reference: "G".into(),
            alternate: "A".into(),
            gene: gene.map(String::from),
            star_allele: star.map(String::from),
            genotype: Some("1/1".into()),
            zygosity: Some(Zygosity::Homozygous),
        }
    }

    fn kb() -> VariantKnowledgeBase {
        VariantKnowledgeBase::from_str(
            r#"{
                "rs3892097": {
                    "gene": "CYP2D6",
                    "star_allele": "*4",
                    "effect": "loss_of_function",
                    "clinical_significance": "Non-functional enzyme"
                },
                "rs4149056": {
                    "effect": "decreased_function"
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_database_entry_wins_over_record_annotations() {
        let kb = kb();
        let enricher = VariantEnricher::new(&kb);
        let enriched = enricher.enrich(&[record("rs3892097", Some("WRONG"), Some("*9"))]);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].gene, "CYP2D6");
        assert_eq!(enriched[0].star_allele, "*4");
        assert_eq!(enriched[0].effect, Effect::LossOfFunction);
        assert_eq!(enriched[0].clinical_significance, "Non-functional enzyme");
        assert_eq!(enriched[0].source, EnrichmentSource::Database);
    }

    #[test]
    fn test_record_annotations_fill_database_gaps() {
        let kb = kb();
        let enricher = VariantEnricher::new(&kb);
        let enriched = enricher.enrich(&[record("rs4149056", Some("SLCO1B1"), Some("*5"))]);
        assert_eq!(enriched[0].gene, "SLCO1B1");
        assert_eq!(enriched[0].star_allele, "*5");
        assert_eq!(enriched[0].effect, Effect::DecreasedFunction);
        assert_eq!(enriched[0].source, EnrichmentSource::Database);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let kb = kb();
        let enricher = VariantEnricher::new(&kb);
        let enriched = enricher.enrich(&[record("RS3892097", None, None)]);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].gene, "CYP2D6");
    }

    #[test]
    fn test_vcf_annotation_path_when_not_in_database() {
        let kb = kb();
        let enricher = VariantEnricher::new(&kb);
        let enriched = enricher.enrich(&[record("rs999", Some("TPMT"), Some("*3A"))]);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].effect, Effect::Unknown);
        assert_eq!(enriched[0].clinical_significance, "Annotated in VCF");
        assert_eq!(enriched[0].source, EnrichmentSource::VcfAnnotation);
    }

    #[test]
    fn test_variant_without_any_gene_is_dropped() {
        let kb = kb();
        let enricher = VariantEnricher::new(&kb);
        // Not in the database and only a STAR tag in the record.
        let enriched = enricher.enrich(&[record("rs999", None, Some("*2"))]);
        assert!(enriched.is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let kb = kb();
        let enricher = VariantEnricher::new(&kb);
        let enriched = enricher.enrich(&[
            record("rs999", Some("TPMT"), Some("*3A")),
            record("rs3892097", None, None),
        ]);
        assert_eq!(enriched[0].rsid, "rs999");
        assert_eq!(enriched[1].rsid, "rs3892097");
    }
}
