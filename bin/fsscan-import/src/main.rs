#![deny(unsafe_code)]

use std::io::Write;
use std::path::PathBuf;
use std::{env, io, process::ExitCode};

use clap::Parser;

use ingest::{IngestConfig, IngestError};

/// Ingests a filesystem scan log (GPFS policy-engine or Lustre `lfs
/// find` output) into a per-filesystem directory-statistics store.
#[derive(Debug, Parser)]
#[command(name = "fsscan-import", version, about)]
struct Cli {
    /// Path to the scan log input file (optionally `.gz`/`.xz`
    /// compressed).
    input_file: PathBuf,

    /// Explicit scan log format; auto-detected from the filename when
    /// omitted.
    #[arg(long)]
    format: Option<String>,

    /// Explicit filesystem name; derived from the input's filename per
    /// the naming contract when omitted.
    #[arg(long)]
    filesystem: Option<String>,

    /// Explicit store path, overriding `FS_SCAN_DB` and the data
    /// directory.
    #[arg(long = "db")]
    db_path: Option<PathBuf>,

    /// Data directory holding per-filesystem stores, overriding
    /// `FS_SCAN_DATA_DIR`.
    #[arg(long = "data-dir")]
    data_dir: Option<PathBuf>,

    /// Number of directories accumulated at the coordinator before a
    /// flush.
    #[arg(long, default_value_t = 10_000)]
    batch_size: usize,

    /// Number of parallel ingest workers.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Drop and recreate all tables before ingest.
    #[arg(long)]
    replace: bool,
}

impl From<Cli> for IngestConfig {
    fn from(cli: Cli) -> Self {
        let mut config = IngestConfig::new(cli.input_file);
        config.format = cli.format;
        config.filesystem = cli.filesystem;
        config.db_path = cli.db_path;
        config.data_dir = cli.data_dir;
        config.batch_size = cli.batch_size;
        config.workers = cli.workers;
        config.replace = cli.replace;
        config
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut stderr = io::stderr().lock();
    run_with(env::args_os(), &mut stderr)
}

fn run_with<I, Err>(args: I, stderr: &mut Err) -> ExitCode
where
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
    Err: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(clap_err) => {
            let _ = write!(stderr, "{clap_err}");
            return exit_code_for_clap_error(&clap_err);
        }
    };

    let config: IngestConfig = cli.into();
    match ingest::run_import(&config) {
        Ok(report) => {
            if !report.is_clean() {
                let _ = writeln!(
                    stderr,
                    "warning: {} file entries had no known parent directory and were dropped",
                    report.files_dropped_anomalous
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = writeln!(stderr, "fsscan-import: {err}");
            exit_code_for_ingest_error(&err)
        }
    }
}

fn exit_code_for_clap_error(err: &clap::Error) -> ExitCode {
    use clap::error::ErrorKind;
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn exit_code_for_ingest_error(_err: &IngestError) -> ExitCode {
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::ExitCode;

    #[test]
    fn version_flag_reports_success() {
        let mut stderr = Vec::new();
        let exit = run_with(["fsscan-import", "--version"], &mut stderr);
        assert_eq!(exit, ExitCode::SUCCESS);
    }

    #[test]
    fn missing_input_file_argument_fails() {
        let mut stderr = Vec::new();
        let exit = run_with(["fsscan-import"], &mut stderr);
        assert_eq!(exit, ExitCode::FAILURE);
    }

    #[test]
    fn successful_ingest_of_a_small_scan_log() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("20260111_srv_asp.list");
        fs::write(&input, "<0> 1 0 0 p=drwxr-xr-x -- /a\n").unwrap();
        let data_dir = dir.path().join("store");

        let mut stderr = Vec::new();
        let exit = run_with(
            [
                "fsscan-import".to_owned(),
                input.to_string_lossy().into_owned(),
                "--data-dir".to_owned(),
                data_dir.to_string_lossy().into_owned(),
            ],
            &mut stderr,
        );
        assert_eq!(exit, ExitCode::SUCCESS);
        assert!(stderr.is_empty());
    }

    #[test]
    fn undetected_format_reports_failure_and_message() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("mystery.bin");
        fs::write(&input, "garbage\n").unwrap();

        let mut stderr = Vec::new();
        let exit = run_with(
            ["fsscan-import".to_owned(), input.to_string_lossy().into_owned()],
            &mut stderr,
        );
        assert_eq!(exit, ExitCode::FAILURE);
        assert!(!stderr.is_empty());
    }
}
