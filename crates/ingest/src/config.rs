use std::path::PathBuf;

/// Explicit configuration for one ingest run, threaded through
/// [`crate::run_import`] rather than read from process-wide globals
/// (spec.md §9 "Global mutable state").
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Path to the scan log input file.
    pub input_file: PathBuf,
    /// Explicit format name; `None` means auto-detect from the
    /// filename.
    pub format: Option<String>,
    /// Explicit filesystem name; `None` means derive it from the
    /// filename per the naming contract (spec.md §6).
    pub filesystem: Option<String>,
    /// Explicit database file path; overrides `data_dir` and
    /// `FS_SCAN_DB`.
    pub db_path: Option<PathBuf>,
    /// Explicit data directory; overrides `FS_SCAN_DATA_DIR`.
    pub data_dir: Option<PathBuf>,
    /// Number of directories accumulated at the coordinator before a
    /// flush (spec.md §4.5 step 3).
    pub batch_size: usize,
    /// Number of parallel workers.
    pub workers: usize,
    /// Drop and recreate all tables before ingest rather than
    /// appending into an existing store.
    pub replace: bool,
    /// Byte-size hint for each chunk handed to a worker.
    pub chunk_bytes: usize,
}

impl IngestConfig {
    /// A config with every optional field absent and the documented
    /// spec.md §6 defaults (`batch_size = 10_000`, `workers = 4`).
    #[must_use]
    pub fn new(input_file: PathBuf) -> Self {
        Self {
            input_file,
            format: None,
            filesystem: None,
            db_path: None,
            data_dir: None,
            batch_size: 10_000,
            workers: 4,
            replace: false,
            chunk_bytes: reader::DEFAULT_CHUNK_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_external_contract() {
        let cfg = IngestConfig::new(PathBuf::from("scan.list"));
        assert_eq!(cfg.batch_size, 10_000);
        assert_eq!(cfg.workers, 4);
        assert!(!cfg.replace);
    }
}
