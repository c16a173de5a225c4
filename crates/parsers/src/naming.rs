//! crates/parsers/src/naming.rs
//!
//! Input file naming contract (spec.md §6): basenames encode the scan
//! date and filesystem name for GPFS-style inputs
//! (`YYYYMMDD_{server}_{filesystem}.list{suffix}`); Lustre inputs
//! (`{anything}.lfs-scan`) carry neither and rely on `--filesystem`.

use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static FILESYSTEM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}_[^_]+_([^.]+)\.list").expect("valid regex"));

static SCAN_DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{8})_").expect("valid regex"));

/// Extracts the filesystem name from a scan log basename, e.g.
/// `20260111_csfs1_asp.list.list_all.log` -> `asp`.
///
/// Returns `None` when the basename doesn't follow the GPFS naming
/// contract (including all Lustre `*.lfs-scan` inputs, which carry no
/// filesystem name of their own).
#[must_use]
pub fn extract_filesystem_from_filename(path: &Path) -> Option<String> {
    let basename = path.file_name()?.to_str()?;
    FILESYSTEM_PATTERN
        .captures(basename)
        .map(|caps| caps[1].to_owned())
}

/// Extracts the scan date from a scan log basename's leading `YYYYMMDD_`
/// prefix.
#[must_use]
pub fn extract_scan_timestamp(path: &Path) -> Option<NaiveDate> {
    let basename = path.file_name()?.to_str()?;
    let caps = SCAN_DATE_PATTERN.captures(basename)?;
    NaiveDate::parse_from_str(&caps[1], "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extracts_filesystem_from_gpfs_name() {
        let p = PathBuf::from("20260111_csfs1_asp.list.list_all.log");
        assert_eq!(extract_filesystem_from_filename(&p).as_deref(), Some("asp"));
    }

    #[test]
    fn extracts_filesystem_with_xz_suffix() {
        let p = PathBuf::from("20260111_csfs1_cisl.list.list_all.log.xz");
        assert_eq!(extract_filesystem_from_filename(&p).as_deref(), Some("cisl"));
    }

    #[test]
    fn no_filesystem_for_lustre_name() {
        let p = PathBuf::from("scratch.lfs-scan");
        assert_eq!(extract_filesystem_from_filename(&p), None);
    }

    #[test]
    fn extracts_scan_date() {
        let p = PathBuf::from("20260111_csfs1_asp.list.list_all.log");
        assert_eq!(
            extract_scan_timestamp(&p),
            NaiveDate::from_ymd_opt(2026, 1, 11)
        );
    }

    #[test]
    fn no_scan_date_without_prefix() {
        let p = PathBuf::from("scratch.lfs-scan");
        assert_eq!(extract_scan_timestamp(&p), None);
    }
}
