//! Contig lengths from the assembly reports, used as locus oracle.

use std::collections::HashMap;

use biocommons_bioutils::assemblies::ASSEMBLY_INFOS;
use enum_map::EnumMap;

use crate::common::{strip_chr, GenomeRelease};

use super::LocusOracle;

/// Contig name to length per genome release.
#[derive(Debug, Clone, Default)]
pub struct ContigLengths {
    lengths: EnumMap<GenomeRelease, HashMap<String, u64>>,
}

/// Key for the lookup tables: no `chr` prefix, mitochondrion as `MT`.
fn canonical_key(contig: &str) -> String {
    match strip_chr(contig) {
        "M" => "MT".to_string(),
        other => other.to_string(),
    }
}

impl ContigLengths {
    /// Build from the assembly reports shipped with `biocommons-bioutils`.
    pub fn from_assemblies() -> Self {
        let lengths = EnumMap::from_fn(|release: GenomeRelease| {
            ASSEMBLY_INFOS[release.into()]
                .sequences
                .iter()
                .map(|seq| (canonical_key(&seq.name), seq.length as u64))
                .collect::<HashMap<_, _>>()
        });
        tracing::debug!(
            "loaded {} GRCh37 and {} GRCh38 contigs",
            lengths[GenomeRelease::Grch37].len(),
            lengths[GenomeRelease::Grch38].len()
        );
        Self { lengths }
    }

    /// Build from explicit `(release, contig, length)` entries.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (GenomeRelease, &'a str, u64)>,
    {
        let mut lengths: EnumMap<GenomeRelease, HashMap<String, u64>> = Default::default();
        for (release, contig, length) in entries {
            lengths[release].insert(canonical_key(contig), length);
        }
        Self { lengths }
    }

    /// Length of `contig` on `release`, if known.
    pub fn length(&self, release: GenomeRelease, contig: &str) -> Option<u64> {
        self.lengths[release].get(&canonical_key(contig)).copied()
    }
}

impl LocusOracle for ContigLengths {
    fn is_valid_contig(&self, release: GenomeRelease, contig: &str) -> bool {
        // The contig must follow the naming rule of the release.
        release.normalize_contig(contig) == contig && self.length(release, contig).is_some()
    }

    fn is_valid_locus(&self, release: GenomeRelease, contig: &str, position: u64) -> bool {
        self.is_valid_contig(release, contig)
            && matches!(self.length(release, contig), Some(length) if (1..=length).contains(&position))
    }
}
