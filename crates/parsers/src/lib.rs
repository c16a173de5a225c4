//! Filesystem scan log parsers and format detection.
//!
//! # Overview
//!
//! A scan log is a text file, one line per filesystem entry, emitted by
//! a scan tool (GPFS's policy engine, Lustre's `lfs find`, or in future
//! a plain POSIX walker). This crate turns lines of a known format into
//! [`ParsedEntry`] values and offers auto-detection from a file's
//! basename so the ingest pipeline never has to sniff line content.
//!
//! # Design
//!
//! The parser set is closed and known at build time, so it is modeled
//! as a tagged union ([`Parser`]) behind a shared trait ([`FormatParser`])
//! rather than `dyn` trait objects — no allocation or indirection is
//! needed to add a format, and an exhaustive `match` anywhere downstream
//! is a compile error away from staying in sync. [`ParserRegistry`] is
//! an explicit value threaded through the ingest entry point; there is
//! no process-wide registry to initialize or race on.
//!
//! # Errors
//!
//! Malformed or partial lines are swallowed by returning `None` from
//! [`FormatParser::parse_line`] — a scan log with a handful of truncated
//! lines should not abort an import. [`ParserError`] is reserved for
//! configuration mistakes, such as requesting a format the registry
//! doesn't know.
//!
//! # Examples
//!
//! ```
//! use parsers::ParserRegistry;
//! use std::path::Path;
//!
//! let registry = ParserRegistry::with_defaults();
//! let parser = registry
//!     .detect(Path::new("20260111_csfs1_asp.list.list_all.log"))
//!     .expect("gpfs should be detected");
//! assert_eq!(parser.format_name(), "gpfs");
//! ```
//!
//! # See also
//!
//! `reader` for turning a (possibly compressed) file into chunks of
//! lines fed to these parsers; `ingest` for the worker pool that drives
//! both.

mod entry;
mod error;
mod gpfs;
mod lustre;
mod naming;
mod posix;
mod registry;

pub use entry::ParsedEntry;
pub use error::{ParserError, ParserResult};
pub use gpfs::GpfsParser;
pub use lustre::LustreParser;
pub use naming::{extract_filesystem_from_filename, extract_scan_timestamp};
pub use posix::PosixParser;
pub use registry::{FormatParser, Parser, ParserRegistry};
