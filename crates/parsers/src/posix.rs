//! crates/parsers/src/posix.rs
//!
//! Parser for generic POSIX filesystem scans (ext4, XFS, ZFS, ...).
//!
//! No scan tool output format has been settled on for POSIX filesystems
//! yet, so this parser never claims a file and never yields an entry.
//! It exists as a registered, closed variant so downstream code can
//! match on `Parser` exhaustively ahead of the format being defined.
//!
//! TODO: define the POSIX scan line grammar (JSON lines vs CSV) once a
//! scan tool is chosen, then implement `parse_line` against it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixParser;

use crate::entry::ParsedEntry;
use crate::registry::FormatParser;

impl FormatParser for PosixParser {
    fn format_name(&self) -> &'static str {
        "posix"
    }

    fn can_parse(&self, _file_name: &str) -> bool {
        false
    }

    fn parse_line(&self, _line: &str) -> Option<ParsedEntry> {
        None
    }
}
