//! Bridge to the external coordinate capabilities: liftover between the two
//! supported genome releases and the locus validity oracle.

use async_trait::async_trait;

use crate::{common::GenomeRelease, matching::schema::Locus};

pub mod contigs;
pub mod ensembl;

pub use contigs::ContigLengths;
pub use ensembl::EnsemblLiftover;

/// Answers whether contigs and positions exist on a reference genome.
pub trait LocusOracle: Send + Sync {
    /// Whether `contig` (already normalized to `release`) names a contig of `release`.
    fn is_valid_contig(&self, release: GenomeRelease, contig: &str) -> bool;

    /// Whether the 1-based `position` lies on `contig` of `release`.
    fn is_valid_locus(&self, release: GenomeRelease, contig: &str, position: u64) -> bool;
}

/// Maps a locus to its counterpart on the other supported genome release.
#[async_trait]
pub trait Liftover: Send + Sync {
    /// Translate `locus` to `locus.release.other()`.
    ///
    /// Returns `Ok(None)` if there is no equivalent locus.
    async fn translate(&self, locus: &Locus) -> Result<Option<Locus>, anyhow::Error>;
}
