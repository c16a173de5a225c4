//! crates/parsers/src/error.rs

use thiserror::Error;

/// Result type for parser registry operations.
pub type ParserResult<T> = Result<T, ParserError>;

/// Errors raised at the parser-selection boundary.
///
/// Individual line parse failures are never represented here: a
/// format-specific parser returns `None` for a malformed or irrelevant
/// line and the pipeline simply counts it as skipped.
#[derive(Debug, Error)]
pub enum ParserError {
    /// An explicit `--format` name was given but no parser is registered
    /// under that name.
    #[error("unknown format: '{0}'")]
    UnknownFormat(String),
}
