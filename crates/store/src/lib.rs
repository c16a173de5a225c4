//! Persisted per-filesystem directory-statistics store.
//!
//! # Overview
//!
//! A [`Store`] wraps a single SQLite database holding one filesystem's
//! directory tree and statistics, built by a single ingest run. The
//! schema (directories, directory_stats, histograms, summaries,
//! metadata) is fixed and versionless; see [`schema`] for the DDL.
//!
//! # Design
//!
//! The store crate owns only the schema, pragma tuning, path
//! resolution, staging-table lifecycle, bucket boundaries, and the
//! three-valued [`Owner`] lattice type. The multi-pass ingest algorithm
//! that populates these tables lives in the `ingest` crate; this crate
//! never reaches for `parsers` or `reader`, only `rusqlite`.
//!
//! # Errors
//!
//! See [`StoreError`].

mod buckets;
mod error;
mod owner;
mod paths;
mod pragmas;
mod schema;
mod staging;
mod store;

pub use buckets::{
    classify_atime_bucket, classify_size_bucket, ATIME_BUCKET_BOUNDS_DAYS, BUCKET_COUNT,
    OLDEST_ATIME_BUCKET, SIZE_BUCKET_BOUNDS_BYTES,
};
pub use error::{StoreError, StoreResult};
pub use owner::Owner;
pub use paths::{resolve_data_dir, resolve_db_path};
pub use pragmas::{configure_for_ingest, finalize_after_ingest};
pub use schema::{drop_all, init};
pub use staging::{create_staging_dirs, drop_staging_dirs};
pub use store::Store;
