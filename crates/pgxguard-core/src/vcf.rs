//! VCF-text variant extraction.
//!
//! Accepts VCF v4.x-style tab-separated text: `##` metadata lines and
//! the `#CHROM` header are skipped, each remaining line is parsed
//! tolerantly. A malformed line is counted and skipped, never fatal.
//! See ARCHITECTURE.md §2.1

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pgxguard_common::Zygosity;

/// Pharmacogenes the downstream tables cover.
const SUPPORTED_GENES: [&str; 6] = ["CYP2D6", "CYP2C19", "CYP2C9", "SLCO1B1", "TPMT", "DPYD"];

/// One genomic position observation. Immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantRecord {
    pub chrom: String,
    pub pos: u64,
    /// rsID when the record carries one, otherwise a synthesized
    /// `chr{chrom}:{pos}` placeholder.
    pub rsid: String,
    pub reference: String,
    pub alternate: String,
    /// GENE tag from the INFO field, if present.
    pub gene: Option<String>,
    /// STAR tag from the INFO field, if present.
    pub star_allele: Option<String>,
    /// Raw GT token from the sample column.
    pub genotype: Option<String>,
    pub zygosity: Option<Zygosity>,
}

/// Line-accounting counters for one parse run.
/// Invariant: `parsed_lines + skipped_lines == total_lines`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParseQuality {
    pub total_lines: usize,
    pub parsed_lines: usize,
    pub skipped_lines: usize,
    pub genes_found: BTreeSet<String>,
}

pub struct VcfParser {
    supported_genes: HashSet<&'static str>,
}

impl VcfParser {
    pub fn new() -> Self {
        Self { supported_genes: SUPPORTED_GENES.into_iter().collect() }
    }

    /// Parse VCF text into variant records, in input order.
    ///
    /// A variant is accepted when its declared gene is supported or
    /// when it declares no gene at all (resolved later against the
    /// knowledge base). Variants declaring an unsupported gene are
    /// dropped and counted as skipped.
    pub fn parse(&self, content: &str) -> (Vec<VariantRecord>, ParseQuality) {
        let mut variants = Vec::new();
        let mut quality = ParseQuality::default();

        for line in content.lines() {
            if line.starts_with("##") || line.starts_with("#CHROM") || line.trim().is_empty() {
                continue;
            }

            quality.total_lines += 1;

            let Some(variant) = parse_line(line) else {
                warn!(line, "malformed VCF line skipped");
                quality.skipped_lines += 1;
                continue;
            };

            match variant.gene.as_deref() {
                Some(gene) if !self.supported_genes.contains(gene) => {
                    debug!(gene, rsid = %variant.rsid, "unsupported gene, variant skipped");
                    quality.skipped_lines += 1;
                }
                gene => {
                    if let Some(gene) = gene {
                        quality.genes_found.insert(gene.to_string());
                    }
                    quality.parsed_lines += 1;
                    variants.push(variant);
                }
            }
        }

        (variants, quality)
    }
}

impl Default for VcfParser {
    fn default() -> Self { Self::new() }
}

/// Parse one data line. `None` when the line has fewer than 8 fields.
fn parse_line(line: &str) -> Option<VariantRecord> {
    let fields: Vec<&str> = line.trim().split('\t').collect();
    if fields.len() < 8 {
        return None;
    }

    let (chrom, pos_raw, id, reference, alternate) =
        (fields[0], fields[1], fields[2], fields[3], fields[4]);
    let info = parse_info(fields[7]);

    let (genotype, zygosity) = if fields.len() >= 10 {
        // First colon-separated token of the sample column is GT.
        let gt = fields[9].split(':').next().unwrap_or("").to_string();
        let zygosity = Zygosity::from_genotype(&gt);
        (Some(gt), Some(zygosity))
    } else {
        (None, None)
    };

    let pos: u64 = pos_raw.parse().unwrap_or(0);
    let rsid = if id == "." {
        format!("chr{chrom}:{pos_raw}")
    } else {
        id.to_string()
    };

    Some(VariantRecord {
        chrom: chrom.to_string(),
        pos,
        rsid,
        reference: reference.to_string(),
        alternate: alternate.to_string(),
        gene: info_value(&info, "GENE"),
        star_allele: info_value(&info, "STAR"),
        genotype,
        zygosity,
    })
}

/// Split a semicolon-separated INFO field into KEY=VALUE pairs.
fn parse_info(info: &str) -> Vec<(String, String)> {
    info.split(';')
        .filter_map(|field| {
            field.split_once('=').map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}

fn info_value(info: &[(String, String)], key: &str) -> Option<String> {
    info.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
##fileformat=VCFv4.2\n\
##source=pgxguard-test\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE1\n\
chr22\t42130692\trs3892097\tG\tA\t.\t.\tGENE=CYP2D6;STAR=*4\tGT\t1/1\n\
chr10\t94781859\trs4244285\tG\tA\t.\t.\tGENE=CYP2C19;STAR=*2\tGT\t0/1\n";

    #[test]
    fn test_parses_data_lines_and_skips_headers() {
        let (variants, quality) = VcfParser::new().parse(SAMPLE);
        assert_eq!(variants.len(), 2);
        assert_eq!(quality.total_lines, 2);
        assert_eq!(quality.parsed_lines, 2);
        assert_eq!(quality.skipped_lines, 0);
        assert!(quality.genes_found.contains("CYP2D6"));
        assert!(quality.genes_found.contains("CYP2C19"));
    }

    #[test]
    fn test_record_fields() {
        let (variants, _) = VcfParser::new().parse(SAMPLE);
        let v = &variants[0];
        assert_eq!(v.chrom, "chr22");
        assert_eq!(v.pos, 42130692);
        assert_eq!(v.rsid, "rs3892097");
        assert_eq!(v.gene.as_deref(), Some("CYP2D6"));
        assert_eq!(v.star_allele.as_deref(), Some("*4"));
        assert_eq!(v.genotype.as_deref(), Some("1/1"));
        assert_eq!(v.zygosity, Some(Zygosity::Homozygous));
    }

    #[test]
    fn test_short_line_counted_as_skipped() {
        let content = "chr1\t100\trs1\tA\n";
        let (variants, quality) = VcfParser::new().parse(content);
        assert!(variants.is_empty());
        assert_eq!(quality.total_lines, 1);
        assert_eq!(quality.skipped_lines, 1);
        assert_eq!(quality.parsed_lines + quality.skipped_lines, quality.total_lines);
    }

    #[test]
    fn test_unsupported_gene_skipped() {
        let content = "chr7\t117559590\trs113993960\tCTT\tC\t.\t.\tGENE=CFTR;STAR=*X\n";
        let (variants, quality) = VcfParser::new().parse(content);
        assert!(variants.is_empty());
        assert_eq!(quality.skipped_lines, 1);
        assert!(quality.genes_found.is_empty());
    }

    #[test]
    fn test_variant_without_gene_is_kept_for_later_resolution() {
        let content = "chr22\t42130692\trs3892097\tG\tA\t.\t.\tDP=30\n";
        let (variants, quality) = VcfParser::new().parse(content);
        assert_eq!(variants.len(), 1);
        assert!(variants[0].gene.is_none());
        assert_eq!(quality.parsed_lines, 1);
    }

    #[test]
    fn test_placeholder_id_synthesized() {
        let content = "22\t42130692\t.\tG\tA\t.\t.\tGENE=CYP2D6\n";
        let (variants, _) = VcfParser::new().parse(content);
        assert_eq!(variants[0].rsid, "chr22:42130692");
    }

    #[test]
    fn test_nonnumeric_position_defaults_to_zero() {
        let content = "chr1\tabc\trs1\tA\tG\t.\t.\tGENE=TPMT\n";
        let (variants, _) = VcfParser::new().parse(content);
        assert_eq!(variants[0].pos, 0);
    }

    #[test]
    fn test_no_sample_column_means_no_zygosity() {
        let content = "chr1\t100\trs1\tA\tG\t.\t.\tGENE=TPMT\n";
        let (variants, _) = VcfParser::new().parse(content);
        assert!(variants[0].genotype.is_none());
        assert!(variants[0].zygosity.is_none());
    }

    #[test]
    fn test_line_accounting_invariant_on_mixed_input() {
        let content = "\
chr22\t42130692\trs3892097\tG\tA\t.\t.\tGENE=CYP2D6;STAR=*4\tGT\t1/1\n\
bad line\n\
chr7\t1000\trs9\tA\tG\t.\t.\tGENE=CFTR\n\
\n\
chr10\t94781859\trs4244285\tG\tA\t.\t.\tGENE=CYP2C19;STAR=*2\tGT\t0/1\n";
        let (variants, quality) = VcfParser::new().parse(content);
        assert_eq!(variants.len(), 2);
        assert_eq!(quality.total_lines, 4);
        assert_eq!(quality.parsed_lines, 2);
        assert_eq!(quality.skipped_lines, 2);
    }
}
