//! Multi-pass filesystem scan ingestion.
//!
//! # Overview
//!
//! [`run_import`] is the single entry point the CLI binary calls: it
//! resolves the input's format and filesystem name, opens the
//! per-filesystem [`store::Store`], and drives Pass 1 (directory
//! discovery), Pass 2a (non-recursive statistics and histograms),
//! Pass 2b (recursive aggregation), and Pass 3 (summaries and scan
//! metadata) in that fixed order (spec.md §2 "Data flow").
//!
//! # Design
//!
//! No step reads process-wide global state: format selection, the data
//! directory, and every tunable are threaded through an explicit
//! [`IngestConfig`] (spec.md §9 "Global mutable state"). Passes 1 and 2a
//! fan out across a `rayon` thread pool of parallel, stateless workers
//! (see [`worker`]); Pass 2b is a pure in-store, depth-ordered
//! computation with no workers at all; Pass 3 is a handful of set-based
//! queries plus a host passwd/group lookup.
//!
//! # Errors
//!
//! See [`IngestError`]. Recoverable conditions never become an `Err`;
//! they are tallied in the returned [`IngestReport`].

mod accumulator;
mod config;
mod error;
mod pass1;
mod pass2a;
mod pass2b;
mod pass3;
mod report;
mod worker;

pub use config::IngestConfig;
pub use error::{IngestError, IngestResult};
pub use report::IngestReport;

use std::path::Path;

use tracing::info;

use parsers::{FormatParser, ParserRegistry};
use reader::ChunkedReader;
use store::Store;

/// Runs one complete ingest: input to persisted, query-ready store.
///
/// Resolves the parser (explicit `--format` or auto-detection by
/// filename), the filesystem name (explicit `--filesystem` or the
/// naming contract), and the store path (explicit path, `FS_SCAN_DB`,
/// or `{data_dir}/{filesystem}.db`), then runs Passes 1 through 3 in
/// order. The input file is read twice -- once per worker-driven pass
/// -- since Pass 1 must fully materialize the directory tree (and its
/// `path_to_id` map) before Pass 2a can resolve any file's parent.
///
/// # Errors
///
/// Returns [`IngestError`] on any fatal condition (spec.md §7):
/// unreadable input, undetected format/filesystem, a worker failure, or
/// a store constraint violation. A fatal error during a run leaves the
/// store in an unspecified state that must be discarded or replaced on
/// retry -- there is no partial-success contract.
pub fn run_import(config: &IngestConfig) -> IngestResult<IngestReport> {
    let registry = ParserRegistry::with_defaults();
    let parser = resolve_parser(&registry, config)?;
    let filesystem = resolve_filesystem(config)?;
    let scan_date = parsers::extract_scan_timestamp(&config.input_file);

    info!(
        input = %config.input_file.display(),
        format = parser.format_name(),
        filesystem = %filesystem,
        workers = config.workers,
        "starting ingest"
    );

    let mut store = Store::open(
        config.db_path.as_deref(),
        config.data_dir.as_deref(),
        &filesystem,
        config.replace,
    )?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()
        .map_err(|err| IngestError::Worker(err.to_string()))?;
    let queue_depth = config.workers.max(1) * 2;

    let mut report = IngestReport::default();

    let dir_reader = ChunkedReader::open(&config.input_file, config.chunk_bytes)?;
    let path_to_id = pass1::discover_directories(dir_reader, parser, &pool, queue_depth, &mut store)?;
    report.directories = path_to_id.len() as u64;

    let file_reader = ChunkedReader::open(&config.input_file, config.chunk_bytes)?;
    let pass2a_summary = pass2a::accumulate_nonrecursive(
        file_reader,
        parser,
        scan_date,
        &pool,
        queue_depth,
        config.batch_size,
        &path_to_id,
        &mut store,
    )?;
    report.files_attributed = pass2a_summary.files_attributed;
    report.files_dropped_anomalous = pass2a_summary.files_dropped_anomalous;
    report.timestamp_anomalies = pass2a_summary.timestamp_anomalies;

    pass2b::aggregate_recursive(&mut store)?;

    let source_file = config
        .input_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_owned();
    let pass3_summary = pass3::summarize(&mut store, &source_file, &filesystem, scan_date)?;
    report.host_lookup_misses = pass3_summary.host_lookup_misses;

    store.finalize()?;

    info!(
        directories = report.directories,
        files_attributed = report.files_attributed,
        files_dropped_anomalous = report.files_dropped_anomalous,
        "ingest complete"
    );

    Ok(report)
}

/// Resolves the format parser: explicit `--format` name is a direct
/// registry lookup (fatal `UnknownFormat` on miss); otherwise tries
/// auto-detection by filename (fatal `UndetectedFormat` if nothing
/// matches).
fn resolve_parser<'a>(
    registry: &'a ParserRegistry,
    config: &IngestConfig,
) -> IngestResult<&'a parsers::Parser> {
    if let Some(name) = &config.format {
        return Ok(registry.get(name)?);
    }
    registry
        .detect(&config.input_file)
        .ok_or_else(|| IngestError::UndetectedFormat(config.input_file.clone()))
}

/// Resolves the filesystem name: explicit `--filesystem` wins, else
/// derived from the input's basename per the naming contract (spec.md
/// §6). Fatal `UndetectedFilesystem` if neither is available (e.g. a
/// Lustre input with no explicit name).
fn resolve_filesystem(config: &IngestConfig) -> IngestResult<String> {
    if let Some(name) = &config.filesystem {
        return Ok(name.clone());
    }
    parsers::extract_filesystem_from_filename(&config.input_file)
        .ok_or_else(|| IngestError::UndetectedFilesystem(config.input_file.clone()))
}

/// Convenience used by the CLI binary to check whether a path looks
/// like a supported scan log before attempting a full import, without
/// constructing an [`IngestConfig`].
#[must_use]
pub fn detect_format(path: &Path) -> Option<&'static str> {
    ParserRegistry::with_defaults()
        .detect(path)
        .map(FormatParser::format_name)
}
