//! Value types of the match pipeline and the beacon response.

use serde::Serialize;

use crate::common::{strip_chr, GenomeRelease};

/// A coordinate on a genome release.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locus {
    /// The genome release.
    pub release: GenomeRelease,
    /// Contig name, spelled according to `release`.
    pub contig: String,
    /// 1-based position.
    pub position: u64,
}

impl Locus {
    /// Variant identifier `contig-position-ref-alt` in the naming of `self.release`.
    pub fn variant_id(&self, allele: &Allele) -> String {
        format!(
            "{}-{}-{}-{}",
            self.contig, self.position, allele.reference, allele.alternative
        )
    }

    /// Variant identifier with the contig's `chr` prefix removed, as used by the
    /// count store.
    pub fn store_key(&self, allele: &Allele) -> String {
        format!(
            "{}-{}-{}-{}",
            strip_chr(&self.contig),
            self.position,
            allele.reference,
            allele.alternative
        )
    }
}

/// Reference/alternative allele pair, passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Allele {
    pub reference: String,
    pub alternative: String,
}

/// Allele and homozygote count, summed over exomes and genomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountTally {
    /// Number of observed alternative alleles.
    pub allele_count: u64,
    /// Number of hom. alt. individuals.
    pub hom_count: u64,
}

impl CountTally {
    /// Aggregate other into self.
    pub fn aggregate(&mut self, other: Self) {
        self.allele_count += other.allele_count;
        self.hom_count += other.hom_count;
    }
}

/// The identity of the calling node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// The authorized party (client ID) from the token.
    pub id: String,
    /// Name from the trust registry, if any.
    pub display_name: Option<String>,
}

impl ClientIdentity {
    /// The name to show in logs, falls back to the ID.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Kind of the handover.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HandoverType {
    pub id: String,
    pub label: String,
}

/// Pointer to a human-readable record.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Handover {
    pub handover_type: HandoverType,
    pub url: String,
}

/// Schema returned by the beacon.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedSchema {
    pub entity_type: String,
    pub schema: String,
}

/// Static response metadata.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub api_version: String,
    pub beacon_id: String,
    pub returned_schemas: Vec<ReturnedSchema>,
}

/// Summary of the match.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ResponseSummary {
    pub exists: bool,
    pub total: i64,
}

/// One genotype category.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub exists: bool,
    pub id: String,
    /// Always empty, no individual-level data is returned.
    pub results: Vec<serde_json::Value>,
    pub results_count: i64,
    pub set_type: String,
}

/// Container of the result sets.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultSets {
    pub result_sets: Vec<ResultSet>,
}

/// The protocol response of `GET /match`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub beacon_handovers: Vec<Handover>,
    pub meta: Meta,
    pub response_summary: ResponseSummary,
    pub response: ResultSets,
}
