//! Diplotype calling and lookup-based phenotype resolution.
//!
//! Absence of variants for a gene is wildtype, not missing data; every
//! path here has a defined fallback and the caller never errors.
//! See ARCHITECTURE.md §2.3

use serde::{Deserialize, Serialize};
use tracing::debug;

use pgxguard_common::{Phenotype, Zygosity};

use crate::enrich::EnrichedVariant;
use crate::reference::DiplotypePhenotypeMap;

/// Canonical wildtype diplotype.
pub const WILDTYPE_DIPLOTYPE: &str = "*1/*1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiplotypeCall {
    /// Ordered `"A/B"` pair. Storage is order-sensitive; lookup is not.
    pub diplotype: String,
    pub phenotype: Phenotype,
}

pub struct DiplotypeCaller<'a> {
    map: &'a DiplotypePhenotypeMap,
}

impl<'a> DiplotypeCaller<'a> {
    pub fn new(map: &'a DiplotypePhenotypeMap) -> Self {
        Self { map }
    }

    /// Pair the detected star alleles for `gene` and resolve the
    /// phenotype.
    ///
    /// Pairing policy: a homozygous variant contributes its allele
    /// twice, any other zygosity once. One allele pairs with wildtype;
    /// with more than two detected, only the first two in input order
    /// form the diplotype — a known limitation for genes with more
    /// complex multi-variant diplotypes.
    pub fn call(&self, enriched: &[EnrichedVariant], gene: &str) -> DiplotypeCall {
        let gene_variants: Vec<&EnrichedVariant> =
            enriched.iter().filter(|v| v.gene == gene).collect();

        let table = self.map.gene(gene);

        if gene_variants.is_empty() {
            let diplotype = table
                .and_then(|t| t.default_no_variant.clone())
                .unwrap_or_else(|| WILDTYPE_DIPLOTYPE.to_string());
            let phenotype = table
                .and_then(|t| t.default_phenotype.as_deref().map(Phenotype::parse_code))
                .unwrap_or(Phenotype::NM);
            debug!(gene, %diplotype, "no variants detected, using wildtype defaults");
            return DiplotypeCall { diplotype, phenotype };
        }

        let mut star_alleles: Vec<&str> = Vec::new();
        for v in &gene_variants {
            if v.star_allele.is_empty() || v.star_allele == "Unknown" {
                continue;
            }
            star_alleles.push(&v.star_allele);
            if v.zygosity == Zygosity::Homozygous {
                star_alleles.push(&v.star_allele);
            }
        }

        if star_alleles.is_empty() {
            // Variants present but none with a resolved star allele.
            return DiplotypeCall {
                diplotype: WILDTYPE_DIPLOTYPE.to_string(),
                phenotype: Phenotype::NM,
            };
        }

        let diplotype = if star_alleles.len() == 1 {
            format!("*1/{}", star_alleles[0])
        } else {
            format!("{}/{}", star_alleles[0], star_alleles[1])
        };

        let phenotype = self.lookup_phenotype(gene, &diplotype);
        DiplotypeCall { diplotype, phenotype }
    }

    /// Direct lookup, then the reversed pair, then `Unknown`.
    fn lookup_phenotype(&self, gene: &str, diplotype: &str) -> Phenotype {
        let Some(table) = self.map.gene(gene) else {
            return Phenotype::Unknown;
        };

        if let Some(p) = table.phenotype_for(diplotype) {
            return p;
        }

        if let Some((a, b)) = diplotype.split_once('/') {
            let reversed = format!("{b}/{a}");
            if let Some(p) = table.phenotype_for(&reversed) {
                debug!(gene, diplotype, reversed, "phenotype found under reversed diplotype");
                return p;
            }
        }

        Phenotype::Unknown
    }
}
