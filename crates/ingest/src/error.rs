use std::path::PathBuf;

use thiserror::Error;

/// Result alias for this crate's fallible operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Fatal errors that abort an ingest run (spec.md §7). Recoverable
/// conditions (`ParseSkip`, `HostLookupMiss`, `TimestampAnomaly`) never
/// appear here: they are tallied in [`crate::IngestReport`] instead.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The input file could not be read.
    #[error("input file error: {0}")]
    Input(#[from] reader::ReaderError),

    /// No parser was registered under an explicit `--format` name, or
    /// none matched the input's filename.
    #[error("no parser for input: {0}")]
    Format(#[from] parsers::ParserError),

    /// `--format`/auto-detection both failed to identify a parser and
    /// no explicit name was given either.
    #[error("could not detect scan log format for '{0}'; pass --format explicitly")]
    UndetectedFormat(PathBuf),

    /// The filesystem name could not be derived from the input's
    /// filename and none was given explicitly.
    #[error("could not derive filesystem name from '{0}'; pass --filesystem explicitly")]
    UndetectedFilesystem(PathBuf),

    /// A worker panicked or a chunk could not be processed; the pool is
    /// shut down and remaining chunks abandoned.
    #[error("worker failure: {0}")]
    Worker(String),

    /// A uniqueness or foreign-key constraint was violated during Pass
    /// 1/2a/2b/3 — a bug in the staging/insert logic, not bad input.
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

// `StoreError` already owns the `#[from] rusqlite::Error` conversion, so
// thiserror can't derive a second one at this level; the passes issue raw
// SQL directly against `Store::connection()`, so this impl spares every
// call site an explicit `.map_err(store::StoreError::from)`.
impl From<rusqlite::Error> for IngestError {
    fn from(err: rusqlite::Error) -> Self {
        IngestError::Store(store::StoreError::from(err))
    }
}
