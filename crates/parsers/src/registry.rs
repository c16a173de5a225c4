//! crates/parsers/src/registry.rs
//!
//! An explicit registry *value* (spec.md §9: "Replace with an explicit
//! registry value passed through the ingest entry point and an explicit
//! config struct; no hidden globals") over a closed, tagged-union set of
//! parsers (spec.md §9: "Sum-type parsers are preferable to dynamic
//! dispatch when the parser set is closed at build time").

use std::path::Path;

use crate::entry::ParsedEntry;
use crate::error::{ParserError, ParserResult};
use crate::gpfs::GpfsParser;
use crate::lustre::LustreParser;
use crate::posix::PosixParser;

/// Shared capability set every concrete parser implements.
pub trait FormatParser {
    /// Short, lowercase format identifier (`"gpfs"`, `"lustre"`, `"posix"`).
    fn format_name(&self) -> &'static str;

    /// Auto-detection by filename, never by content.
    fn can_parse(&self, file_name: &str) -> bool;

    /// Parse a single line; `None` for malformed, header, or irrelevant
    /// lines. Never fails the pipeline, never performs I/O.
    fn parse_line(&self, line: &str) -> Option<ParsedEntry>;
}

/// Closed set of supported scan log formats.
#[derive(Debug, Clone, Copy)]
pub enum Parser {
    /// GPFS policy-engine scan output.
    Gpfs(GpfsParser),
    /// Lustre `lfs find` scan output.
    Lustre(LustreParser),
    /// Generic POSIX scan output (not yet defined).
    Posix(PosixParser),
}

impl FormatParser for Parser {
    fn format_name(&self) -> &'static str {
        match self {
            Self::Gpfs(p) => p.format_name(),
            Self::Lustre(p) => p.format_name(),
            Self::Posix(p) => p.format_name(),
        }
    }

    fn can_parse(&self, file_name: &str) -> bool {
        match self {
            Self::Gpfs(p) => p.can_parse(file_name),
            Self::Lustre(p) => p.can_parse(file_name),
            Self::Posix(p) => p.can_parse(file_name),
        }
    }

    fn parse_line(&self, line: &str) -> Option<ParsedEntry> {
        match self {
            Self::Gpfs(p) => p.parse_line(line),
            Self::Lustre(p) => p.parse_line(line),
            Self::Posix(p) => p.parse_line(line),
        }
    }
}

/// Registration-order-preserving set of parsers. `detect_parser` tries
/// entries in the order they were registered; selection by explicit
/// name is a direct lookup.
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry {
    parsers: Vec<Parser>,
}

impl ParserRegistry {
    /// An empty registry. Use [`ParserRegistry::with_defaults`] for the
    /// standard GPFS-then-Lustre priority order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard registry: GPFS before Lustre, matching the priority
    /// order `fs_scans/parsers/__init__.py` registers in. POSIX is a
    /// known variant but, as in the original, is not auto-registered
    /// since its format is undefined.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Parser::Gpfs(GpfsParser));
        registry.register(Parser::Lustre(LustreParser));
        registry
    }

    /// Appends a parser at the end of the detection priority list.
    pub fn register(&mut self, parser: Parser) {
        self.parsers.push(parser);
    }

    /// Tries each registered parser's `can_parse` in registration order;
    /// returns the first match, or `None` if none matches.
    #[must_use]
    pub fn detect(&self, path: &Path) -> Option<&Parser> {
        let file_name = path.file_name()?.to_str()?;
        self.parsers.iter().find(|p| p.can_parse(file_name))
    }

    /// Looks up a parser by its explicit format name.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::UnknownFormat`] if no parser registered
    /// under `name`.
    pub fn get(&self, name: &str) -> ParserResult<&Parser> {
        self.parsers
            .iter()
            .find(|p| p.format_name() == name)
            .ok_or_else(|| ParserError::UnknownFormat(name.to_owned()))
    }

    /// Sorted list of registered format names.
    #[must_use]
    pub fn list_formats(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.parsers.iter().map(FormatParser::format_name).collect();
        names.sort_unstable();
        names
    }
}
