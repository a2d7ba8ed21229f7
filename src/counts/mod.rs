//! Access to the variant count store.
//!
//! Two implementations share the [`CountStore`] contract: a keyed lookup in a
//! RocksDB database and a table scan over the counts TSV file.  A miss is not
//! an error but yields an all-zero tally.

use std::sync::Arc;

use crate::{
    common::GenomeRelease,
    matching::schema::{Allele, CountTally, Locus},
};

pub mod ds;
pub mod rocks;
pub mod tsv;

pub use rocks::RocksDbCountStore;
pub use tsv::TsvCountStore;

/// Default dataset namespace.
pub const DEFAULT_NAMESPACE: &str = "default";
/// Default dataset type.
pub const DEFAULT_DATASET_TYPE: &str = "SNV_INDEL";

/// Name of the RocksDB column family holding the counts of `release`.
pub fn cf_name(release: GenomeRelease) -> String {
    release.to_string()
}

/// Lookup of aggregate counts for one variant on one genome release.
pub trait CountStore: Send + Sync {
    /// Return the summed exome and genome counts, `{0, 0}` on a miss.
    fn lookup(&self, locus: &Locus, allele: &Allele) -> Result<CountTally, anyhow::Error>;
}

/// The part of the store a gateway instance reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreScope {
    /// Dataset namespace.
    pub namespace: String,
    /// Dataset type, e.g., `SNV_INDEL`.
    pub dataset_type: String,
}

impl Default for StoreScope {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            dataset_type: DEFAULT_DATASET_TYPE.to_string(),
        }
    }
}

impl StoreScope {
    /// Build the RocksDB key for `variant_id`.
    pub fn key(&self, variant_id: &str) -> String {
        format!("{}/{}/{}", self.namespace, self.dataset_type, variant_id)
    }
}

/// Selection of the count store implementation.
#[derive(
    clap::ValueEnum,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum CountStoreKind {
    /// Keyed lookup in RocksDB built with `db import-counts`.
    #[default]
    Rocksdb,
    /// Table scan over the counts TSV file.
    Tsv,
}

/// Open the configured count store.
pub fn open_count_store(
    kind: CountStoreKind,
    path: &str,
    scope: StoreScope,
) -> Result<Arc<dyn CountStore>, anyhow::Error> {
    tracing::info!("Opening {} count store at {}", kind, path);
    Ok(match kind {
        CountStoreKind::Rocksdb => Arc::new(RocksDbCountStore::open(path, scope)?),
        CountStoreKind::Tsv => Arc::new(TsvCountStore::new(path, scope)?),
    })
}
