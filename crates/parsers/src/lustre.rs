//! crates/parsers/src/lustre.rs
//!
//! Parser for Lustre `lfs find` scan log lines.
//!
//! ```text
//! 0xHEX:0xHEX:0xHEX <key=value pairs> -- <absolute path>
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

use crate::entry::ParsedEntry;
use crate::registry::FormatParser;

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0x[0-9a-f]+:0x[0-9a-f]+:0x[0-9a-f]+\s+(.+?)\s+--\s+(.+)$").expect("valid regex")
});
static SIZE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"s=(\d+)").expect("valid regex"));
static BLOCKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"b=(\d+)").expect("valid regex"));
static USER_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"u=(\d+)").expect("valid regex"));
static GROUP_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"g=(\d+)").expect("valid regex"));
static FILE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"type=([df])").expect("valid regex"));
static ATIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"a=(\d+)").expect("valid regex"));

/// Lustre `lfs find` scan line parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct LustreParser;

impl FormatParser for LustreParser {
    fn format_name(&self) -> &'static str {
        "lustre"
    }

    fn can_parse(&self, file_name: &str) -> bool {
        file_name.ends_with(".lfs-scan")
    }

    fn parse_line(&self, line: &str) -> Option<ParsedEntry> {
        let caps = LINE_PATTERN.captures(line)?;
        let fields = &caps[1];
        let path = caps[2].to_owned();

        let size: u64 = SIZE.captures(fields)?[1].parse().ok()?;
        let blocks: u64 = BLOCKS.captures(fields)?[1].parse().ok()?;
        let uid: u32 = USER_ID.captures(fields)?[1].parse().ok()?;
        let gid: u32 = GROUP_ID.captures(fields)?[1].parse().ok()?;
        let is_dir = &FILE_TYPE.captures(fields)?[1] == "d";
        let atime_epoch: i64 = ATIME.captures(fields)?[1].parse().ok()?;

        let allocated = blocks * 512;
        let atime: Option<NaiveDateTime> = DateTime::from_timestamp(atime_epoch, 0)
            .map(|dt| dt.naive_utc());

        Some(ParsedEntry {
            path,
            size,
            allocated,
            uid,
            gid,
            is_dir,
            atime,
            inode: None,
            fileset_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_lustre_filename() {
        let p = LustreParser;
        assert!(p.can_parse("scratch.lfs-scan"));
        assert!(!p.can_parse("20260111_csfs1_asp.list.list_all.log"));
    }

    #[test]
    fn parses_directory_line() {
        let p = LustreParser;
        let line = "0x24001959d:0x1f:0x0 s=4096 b=8 u=38057 g=68122 type=d a=1769700762 -- /x";
        let entry = p.parse_line(line).expect("should parse");
        assert!(entry.is_dir);
        assert_eq!(entry.path, "/x");
    }

    #[test]
    fn parses_file_line() {
        let p = LustreParser;
        let line = "0x24001959d:0x1f:0x0 s=16384 b=32 u=38057 g=68122 type=f a=1769700762 -- /x/f";
        let entry = p.parse_line(line).expect("should parse");
        assert!(!entry.is_dir);
        assert_eq!(entry.allocated, 32 * 512);
        assert_eq!(entry.uid, 38057);
        assert_eq!(entry.gid, 68122);
        assert!(entry.atime.is_some());
    }

    #[test]
    fn missing_required_field_is_skipped() {
        let p = LustreParser;
        let line = "0x24001959d:0x1f:0x0 s=16384 u=38057 type=f -- /x/f";
        assert!(p.parse_line(line).is_none());
    }
}
