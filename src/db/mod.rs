//! Code supporting the `db *` sub commands.

pub mod import_counts;
