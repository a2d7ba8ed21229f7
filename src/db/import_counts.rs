//! Implementation of `db import-counts` subcommand.

use std::{path::Path, path::PathBuf, sync::Arc};

use crate::{
    common,
    counts::{
        cf_name,
        ds::Counts,
        rocks::{cf_names, DB_NAME},
        tsv::read_rows,
        StoreScope,
    },
};

/// Command line arguments for `db import-counts` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "Build keyed counts database from TSV", long_about = None)]
pub struct Args {
    /// Path to input counts TSV file(s), `@path` reads paths from a file.
    #[clap(long, required = true)]
    pub path_input: Vec<String>,
    /// Path to the output RocksDB.
    #[clap(long)]
    pub path_out_rocksdb: String,
    /// Optional path to RocksDB WAL directory.
    #[arg(long)]
    pub path_wal_dir: Option<String>,
}

/// Import the rows of all `paths` into a new RocksDB at `path_out`.
///
/// Rows for the same key are aggregated.
pub fn import_counts(
    paths: &[PathBuf],
    path_out: &Path,
    path_wal_dir: Option<&str>,
) -> Result<(), anyhow::Error> {
    let mut options = rocksdb_utils_lookup::tune_options(rocksdb::Options::default(), path_wal_dir);
    options.create_if_missing(true);
    options.create_missing_column_families(true);
    let cf_names = cf_names();

    let db: Arc<rocksdb::DBWithThreadMode<rocksdb::MultiThreaded>> = Arc::new(
        rocksdb::DBWithThreadMode::open_cf_with_opts(
            &options,
            path_out,
            cf_names
                .iter()
                .map(|name| (name.clone(), options.clone()))
                .collect::<Vec<_>>(),
        )
        .map_err(|e| {
            anyhow::anyhow!(
                "problem opening output database {}: {}",
                path_out.display(),
                e
            )
        })?,
    );

    tracing::info!("  writing meta information");
    let cf_meta = db
        .cf_handle("meta")
        .ok_or_else(|| anyhow::anyhow!("no meta column family"))?;
    db.put_cf(&cf_meta, "vlm-gateway-version", common::worker_version())?;
    db.put_cf(&cf_meta, "db-name", DB_NAME)?;

    let mut prev = std::time::Instant::now();
    let mut count = 0usize;
    for path in paths {
        tracing::info!("Importing {} ...", path.display());
        for row in read_rows(path)? {
            let row = row.map_err(|e| {
                anyhow::anyhow!("problem reading counts file {}: {}", path.display(), e)
            })?;
            let release = row.release()?;
            let cf_counts = db
                .cf_handle(&cf_name(release))
                .ok_or_else(|| anyhow::anyhow!("no column family for {}", release))?;
            let scope = StoreScope {
                namespace: row.namespace.clone(),
                dataset_type: row.dataset_type.clone(),
            };
            let key = scope.key(&row.variant_id);

            let mut counts = db
                .get_cf(&cf_counts, key.as_bytes())
                .map_err(|e| anyhow::anyhow!("problem reading counts for {}: {}", &key, e))?
                .map(|buf| Counts::from_vec(&buf))
                .transpose()?
                .unwrap_or_default();
            counts.aggregate(&row.counts());
            db.put_cf(&cf_counts, key.as_bytes(), counts.to_vec())
                .map_err(|e| anyhow::anyhow!("problem writing counts for {}: {}", &key, e))?;

            count += 1;
            // Write out progress indicator every 60 seconds.
            if prev.elapsed().as_secs() >= 60 {
                tracing::info!("at {} ({} rows)", &key, count);
                prev = std::time::Instant::now();
            }
        }
    }
    tracing::info!("... imported {} rows", count);

    tracing::info!("Running RocksDB compaction ...");
    let before_compaction = std::time::Instant::now();
    rocksdb_utils_lookup::force_compaction_cf(&db, &cf_names, Some("  "), true)?;
    tracing::info!(
        "... done compacting RocksDB in {:?}",
        before_compaction.elapsed()
    );

    Ok(())
}

/// Main entry point for `db import-counts` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    // Build path of all input files to read, read through files given by `@path`.
    let mut path_input = Vec::new();
    for path in &args.path_input {
        if let Some(list_path) = path.strip_prefix('@') {
            let contents = std::fs::read_to_string(list_path)
                .map_err(|e| anyhow::anyhow!("could not read path list {}: {}", list_path, e))?;
            path_input.extend(
                contents
                    .lines()
                    .map(|line| line.trim())
                    .filter(|line| !line.is_empty())
                    .map(PathBuf::from),
            );
        } else {
            path_input.push(PathBuf::from(path));
        }
    }

    import_counts(
        &path_input,
        Path::new(&args.path_out_rocksdb),
        args.path_wal_dir.as_deref(),
    )?;

    tracing::info!(
        "All of `db import-counts` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
