//! crates/parsers/src/entry.rs
//!
//! The normalized record every format-specific parser emits.

use chrono::NaiveDateTime;

/// A single file or directory entry parsed from a filesystem scan log.
///
/// Identical shape regardless of source format (GPFS, Lustre, POSIX):
/// parsers are pure functions from a raw line to an optional `ParsedEntry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    /// Absolute, slash-separated path.
    pub path: String,
    /// Logical size in bytes.
    pub size: u64,
    /// Disk space allocated in bytes.
    pub allocated: u64,
    /// Numeric user id of the owner.
    pub uid: u32,
    /// Numeric group id of the owner.
    pub gid: u32,
    /// True for directory entries, false for files.
    pub is_dir: bool,
    /// Last access time, absent when the format doesn't report one or the
    /// timestamp failed to parse.
    pub atime: Option<NaiveDateTime>,
    /// Inode number, when the format provides one as an identity key.
    pub inode: Option<u64>,
    /// Fileset id, GPFS-specific identity key.
    pub fileset_id: Option<u64>,
}

impl ParsedEntry {
    /// The parent directory path, i.e. `path` with its final component
    /// removed. Used as the Pass 2a accumulation key.
    #[must_use]
    pub fn parent_path(&self) -> &str {
        match self.path.rfind('/') {
            Some(0) => "/",
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> ParsedEntry {
        ParsedEntry {
            path: path.to_owned(),
            size: 0,
            allocated: 0,
            uid: 0,
            gid: 0,
            is_dir: false,
            atime: None,
            inode: None,
            fileset_id: None,
        }
    }

    #[test]
    fn parent_path_of_nested_file() {
        assert_eq!(entry("/a/b/f").parent_path(), "/a/b");
    }

    #[test]
    fn parent_path_of_root_child() {
        assert_eq!(entry("/a").parent_path(), "/");
    }
}
