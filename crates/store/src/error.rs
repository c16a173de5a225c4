use std::path::PathBuf;

/// Result alias for this crate's fallible operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while opening, initializing, or writing the persisted
/// directory-statistics store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The resolved data directory could not be created or is not a
    /// directory.
    #[error("data directory '{path}' is unusable: {source}")]
    DataDir {
        /// The directory that could not be prepared.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A SQLite operation failed.
    #[error("store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A uniqueness or foreign-key constraint was violated by the
    /// staging/insert logic. Indicates a bug upstream, not bad input.
    #[error("store consistency violation: {0}")]
    Violation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_message_is_preserved() {
        let err = StoreError::Violation("duplicate dir_id".to_owned());
        assert!(err.to_string().contains("duplicate dir_id"));
    }
}
