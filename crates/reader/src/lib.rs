//! Chunked, transparently-decompressing line reader for scan log inputs.
//!
//! # Overview
//!
//! Scan logs can be tens of gigabytes. [`ChunkedReader`] streams a file
//! as a lazy sequence of line batches sized by a byte hint, so the
//! ingest worker pool can hand one batch at a time to a worker without
//! holding the whole file in memory.
//!
//! # Design
//!
//! Compression is detected purely from the filename suffix (`.gz`,
//! `.xz`) and handled transparently; callers never see a compressed
//! byte. Decoding uses UTF-8-with-replacement rather than failing on
//! the odd non-UTF-8 byte a scan tool emits.
//!
//! # Invariants
//!
//! - Each yielded batch is a whole number of lines; a line is never
//!   split across batches.
//! - A batch's uncompressed byte size is at least `chunk_bytes` unless
//!   it is the final batch.
//! - The file handle is released as soon as the reader is dropped,
//!   on any exit path.
//!
//! # Errors
//!
//! See [`ReaderError`].

mod chunked;
mod error;

pub use chunked::{ChunkedReader, DEFAULT_CHUNK_BYTES};
pub use error::{ReaderError, ReaderResult};
