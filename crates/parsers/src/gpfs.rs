//! crates/parsers/src/gpfs.rs
//!
//! Parser for GPFS policy-engine scan log lines.
//!
//! ```text
//! <thread> inode fileset_id snapshot <key=value pairs> -- <absolute path>
//! ```

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::entry::ParsedEntry;
use crate::registry::FormatParser;

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<\d+>\s+(\d+)\s+(\d+)\s+\d+\s+(.+?)\s+--\s+(.+)$").expect("valid regex")
});
static SIZE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"s=(\d+)").expect("valid regex"));
static ALLOCATED_KB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"a=(\d+)").expect("valid regex"));
static USER_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"u=(\d+)").expect("valid regex"));
static GROUP_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"g=(\d+)").expect("valid regex"));
static PERMISSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"p=([^\s]+)").expect("valid regex"));
static ATIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ac=(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})").expect("valid regex")
});

/// One inode's worth of inline data; below this GPFS may report
/// `a=0` for data stored directly in the inode rather than allocated
/// blocks.
const INLINE_INODE_BYTES: u64 = 4096;

/// GPFS policy-scan line parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct GpfsParser;

impl FormatParser for GpfsParser {
    fn format_name(&self) -> &'static str {
        "gpfs"
    }

    fn can_parse(&self, file_name: &str) -> bool {
        static NAME_PATTERN: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^\d{8}_[^_]+_[^.]+\.list").expect("valid regex"));
        NAME_PATTERN.is_match(file_name)
    }

    fn parse_line(&self, line: &str) -> Option<ParsedEntry> {
        let caps = LINE_PATTERN.captures(line)?;
        let inode: u64 = caps[1].parse().ok()?;
        let fileset_id: u64 = caps[2].parse().ok()?;
        let fields = &caps[3];
        let path = caps[4].to_owned();

        let permissions = PERMISSIONS.captures(fields)?;
        let is_dir = permissions[1].starts_with('d');

        let size: u64 = SIZE.captures(fields)?[1].parse().ok()?;
        let uid: u32 = USER_ID.captures(fields)?[1].parse().ok()?;
        let gid: u32 = GROUP_ID
            .captures(fields)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0);

        let mut allocated = ALLOCATED_KB
            .captures(fields)
            .and_then(|c| c[1].parse::<u64>().ok())
            .map_or(0, |kb| kb * 1024);
        if allocated == 0 && size <= INLINE_INODE_BYTES {
            allocated = size;
        }

        let atime = ATIME.captures(fields).and_then(|c| {
            NaiveDateTime::parse_from_str(&c[1], "%Y-%m-%d %H:%M:%S").ok()
        });

        Some(ParsedEntry {
            path,
            size,
            allocated,
            uid,
            gid,
            is_dir,
            atime,
            inode: Some(inode),
            fileset_id: Some(fileset_id),
        })
    }
}
