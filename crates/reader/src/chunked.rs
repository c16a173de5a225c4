use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use xz2::read::XzDecoder;

use crate::error::{ReaderError, ReaderResult};

/// Default byte-size hint for a chunk, matching the staging batch size
/// used for directory discovery.
pub const DEFAULT_CHUNK_BYTES: usize = 32 * 1024 * 1024;

fn open_decoded(path: &Path) -> ReaderResult<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|source| ReaderError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let reader: Box<dyn Read + Send> = if name.ends_with(".gz") {
        Box::new(MultiGzDecoder::new(file))
    } else if name.ends_with(".xz") {
        Box::new(XzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::with_capacity(1 << 16, reader)))
}

/// Streams a scan log input file as byte-bounded batches of lines.
///
/// Transparently decompresses `.gz`/`.xz` inputs by filename suffix.
/// Malformed UTF-8 is replaced rather than treated as an error, matching
/// the source importer's `open(..., errors="replace")`. The underlying
/// file handle is owned by this reader and released when it is dropped,
/// on any exit path: exhausted, short-circuited, or dropped on error.
pub struct ChunkedReader {
    inner: Box<dyn BufRead + Send>,
    chunk_bytes: usize,
    done: bool,
}

impl ChunkedReader {
    /// Opens `path`, decompressing transparently if its suffix is
    /// recognized. `chunk_bytes` bounds each batch's uncompressed size;
    /// a batch only exceeds it to finish the line already in progress.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::Open`] if the file cannot be opened.
    pub fn open(path: &Path, chunk_bytes: usize) -> ReaderResult<Self> {
        Ok(Self {
            inner: open_decoded(path)?,
            chunk_bytes,
            done: false,
        })
    }
}

impl Iterator for ChunkedReader {
    type Item = ReaderResult<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::new();
        let mut batch_bytes = 0usize;
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let read = match self.inner.read_until(b'\n', &mut raw) {
                Ok(n) => n,
                Err(source) => return Some(Err(ReaderError::Read(source))),
            };
            if read == 0 {
                self.done = true;
                break;
            }
            batch_bytes += raw.len();
            let line = String::from_utf8_lossy(&raw).into_owned();
            let line = line.trim_end_matches(['\n', '\r']).to_owned();
            batch.push(line);
            if batch_bytes >= self.chunk_bytes {
                break;
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_plain_text_in_one_batch_when_chunk_is_large() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "line one").unwrap();
        writeln!(file, "line two").unwrap();
        let reader = ChunkedReader::open(file.path(), DEFAULT_CHUNK_BYTES).unwrap();
        let batches: Vec<_> = reader.map(Result::unwrap).collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec!["line one", "line two"]);
    }

    #[test]
    fn splits_into_multiple_batches_when_chunk_is_small() {
        let mut file = NamedTempFile::new().unwrap();
        for i in 0..10 {
            writeln!(file, "entry {i}").unwrap();
        }
        let reader = ChunkedReader::open(file.path(), 16).unwrap();
        let batches: Vec<_> = reader.map(Result::unwrap).collect();
        assert!(batches.len() > 1);
        let total_lines: usize = batches.iter().map(Vec::len).sum();
        assert_eq!(total_lines, 10);
    }

    #[test]
    fn decompresses_gzip_transparently() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.list.gz");
        {
            let file = File::create(&path).unwrap();
            let mut encoder = GzEncoder::new(file, Compression::default());
            writeln!(encoder, "compressed line").unwrap();
            encoder.finish().unwrap();
        }
        let reader = ChunkedReader::open(&path, DEFAULT_CHUNK_BYTES).unwrap();
        let batches: Vec<_> = reader.map(Result::unwrap).collect();
        assert_eq!(batches[0], vec!["compressed line"]);
    }

    #[test]
    fn decompresses_xz_transparently() {
        use xz2::write::XzEncoder;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.list.xz");
        {
            let file = File::create(&path).unwrap();
            let mut encoder = XzEncoder::new(file, 6);
            writeln!(encoder, "xz line").unwrap();
            encoder.finish().unwrap();
        }
        let reader = ChunkedReader::open(&path, DEFAULT_CHUNK_BYTES).unwrap();
        let batches: Vec<_> = reader.map(Result::unwrap).collect();
        assert_eq!(batches[0], vec!["xz line"]);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let path = Path::new("/no/such/scan/file.list");
        assert!(matches!(
            ChunkedReader::open(path, DEFAULT_CHUNK_BYTES),
            Err(ReaderError::Open { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"valid\xff\xfebytes\n").unwrap();
        let reader = ChunkedReader::open(file.path(), DEFAULT_CHUNK_BYTES).unwrap();
        let batches: Vec<_> = reader.map(Result::unwrap).collect();
        assert_eq!(batches.len(), 1);
        assert!(batches[0][0].contains('\u{FFFD}'));
    }
}
