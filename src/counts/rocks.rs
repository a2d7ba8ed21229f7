//! Keyed count store in a RocksDB database.

use std::{path::Path, sync::Arc};

use strum::IntoEnumIterator;

use crate::{
    common::GenomeRelease,
    matching::schema::{Allele, CountTally, Locus},
};

use super::{cf_name, ds::Counts, CountStore, StoreScope};

/// Value of `db-name` in the `meta` column family.
pub const DB_NAME: &str = "vlm-counts";

/// Names of all column families of the counts database.
pub fn cf_names() -> Vec<String> {
    let mut result = vec!["meta".to_string()];
    result.extend(GenomeRelease::iter().map(cf_name));
    result
}

/// Looks up counts by `<namespace>/<dataset type>/<variant id>` in the column
/// family of the genome release.
pub struct RocksDbCountStore {
    db: Arc<rocksdb::DBWithThreadMode<rocksdb::MultiThreaded>>,
    scope: StoreScope,
}

impl std::fmt::Debug for RocksDbCountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbCountStore")
            .field("path", &self.db.path())
            .field("scope", &self.scope)
            .finish()
    }
}

impl RocksDbCountStore {
    /// Open the database at `path` read-only.
    pub fn open<P: AsRef<Path>>(path: P, scope: StoreScope) -> Result<Self, anyhow::Error> {
        let options = rocksdb::Options::default();
        let db = rocksdb::DBWithThreadMode::<rocksdb::MultiThreaded>::open_cf_for_read_only(
            &options,
            path.as_ref(),
            cf_names(),
            false,
        )
        .map_err(|e| {
            anyhow::anyhow!(
                "problem opening counts database at {}: {}",
                path.as_ref().display(),
                e
            )
        })?;

        if let Some(cf_meta) = db.cf_handle("meta") {
            if let Ok(Some(version)) = db.get_cf(&cf_meta, "vlm-gateway-version") {
                tracing::info!(
                    "counts database built with version {}",
                    String::from_utf8_lossy(&version)
                );
            }
        }

        Ok(Self {
            db: Arc::new(db),
            scope,
        })
    }
}

impl CountStore for RocksDbCountStore {
    fn lookup(&self, locus: &Locus, allele: &Allele) -> Result<CountTally, anyhow::Error> {
        let cf_counts = self
            .db
            .cf_handle(&cf_name(locus.release))
            .ok_or_else(|| anyhow::anyhow!("no column family for {}", locus.release))?;
        let key = self.scope.key(&locus.store_key(allele));
        let raw_value = self.db.get_cf(&cf_counts, key.as_bytes()).map_err(|e| {
            anyhow::anyhow!("problem querying counts database for {}: {}", &key, e)
        })?;

        let counts = raw_value
            .map(|buf| Counts::from_vec(&buf))
            .transpose()
            .map_err(|e| anyhow::anyhow!("problem decoding counts for {}: {}", &key, e))?
            .unwrap_or_default();
        tracing::trace!("{:?} on {} -> {:?}", &key, locus.release, &counts);
        Ok(counts.into())
    }
}
