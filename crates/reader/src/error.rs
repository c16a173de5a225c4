use std::io;
use std::path::PathBuf;

/// Result alias for this crate's fallible operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Errors produced while opening or streaming a scan log input file.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The input file does not exist or could not be opened.
    #[error("cannot open input file '{path}': {source}")]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Reading from the (possibly decompressing) stream failed.
    #[error("error reading input: {0}")]
    Read(#[source] #[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_includes_path() {
        let err = ReaderError::Open {
            path: PathBuf::from("/no/such/file"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/no/such/file"));
    }
}
