//! Table-scan count store over the counts TSV file.

use std::{
    io::BufRead,
    path::{Path, PathBuf},
};

use crate::{
    common::{io::open_read_maybe_gz, GenomeRelease},
    matching::schema::{Allele, CountTally, Locus},
};

use super::{ds::Counts, CountStore, StoreScope};

/// One line of the counts TSV file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Row {
    /// Dataset namespace.
    pub namespace: String,
    /// Genome release, e.g., `GRCh37`.
    pub genome_build: String,
    /// Dataset type, e.g., `SNV_INDEL`.
    pub dataset_type: String,
    /// Variant identifier `contig-position-ref-alt` without `chr` prefix.
    pub variant_id: String,
    pub ac_exome: u32,
    pub ac_genome: u32,
    pub hom_exome: u32,
    pub hom_genome: u32,
}

impl Row {
    /// The parsed genome release.
    pub fn release(&self) -> Result<GenomeRelease, anyhow::Error> {
        self.genome_build.parse()
    }

    /// The counts of the row.
    pub fn counts(&self) -> Counts {
        Counts {
            ac_exome: self.ac_exome,
            ac_genome: self.ac_genome,
            hom_exome: self.hom_exome,
            hom_genome: self.hom_genome,
        }
    }
}

/// Iterate the rows of the counts TSV file at `path`, gzip is detected by extension.
pub fn read_rows(
    path: &Path,
) -> Result<csv::DeserializeRecordsIntoIter<Box<dyn BufRead>, Row>, anyhow::Error> {
    let reader = open_read_maybe_gz(path).map_err(|e| {
        anyhow::anyhow!(
            "could not open counts file {} for reading: {}",
            path.display(),
            e
        )
    })?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader)
        .into_deserialize())
}

/// Scans the whole counts file on every lookup.
#[derive(Debug, Clone)]
pub struct TsvCountStore {
    path: PathBuf,
    scope: StoreScope,
}

impl TsvCountStore {
    /// Construct for the file at `path`.
    pub fn new(path: &str, scope: StoreScope) -> Result<Self, anyhow::Error> {
        let path = PathBuf::from(path);
        if !path.is_file() {
            anyhow::bail!("counts file {} does not exist", path.display());
        }
        Ok(Self { path, scope })
    }
}

impl CountStore for TsvCountStore {
    fn lookup(&self, locus: &Locus, allele: &Allele) -> Result<CountTally, anyhow::Error> {
        let variant_id = locus.store_key(allele);
        let mut counts = Counts::default();
        for row in read_rows(&self.path)? {
            let row = row.map_err(|e| {
                anyhow::anyhow!("problem reading counts file {}: {}", self.path.display(), e)
            })?;
            if row.variant_id == variant_id
                && row.namespace == self.scope.namespace
                && row.dataset_type == self.scope.dataset_type
                && row.release()? == locus.release
            {
                counts.aggregate(&row.counts());
            }
        }
        tracing::trace!("{:?} on {} -> {:?}", &variant_id, locus.release, &counts);
        Ok(counts.into())
    }
}
