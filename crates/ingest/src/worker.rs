//! Rayon-driven worker pool translating the original's
//! `multiprocessing.Pool` into OS threads (SPEC_FULL §5): chunks are
//! produced by one thread reading [`ChunkedReader`] into a bounded
//! `crossbeam-channel` queue (the backpressure point — production
//! blocks once `queue_depth` chunks are in flight) and consumed by a
//! `rayon` scope via [`ParallelBridge`], so the next idle worker always
//! pulls the next queued chunk. Each worker is a pure function from a
//! chunk to an owned partial aggregate; nothing is shared between
//! workers.

use std::thread;

use crossbeam_channel::bounded;
use parsers::{FormatParser, Parser};
use rayon::iter::{ParallelBridge, ParallelIterator};
use reader::ChunkedReader;

use crate::accumulator::{DirStatsAccumulator, FileChunkResult, HistAccumulator};
use crate::error::{IngestError, IngestResult};

/// One directory entry discovered while scanning in "directories" mode
/// (Pass 1). `fileset_id`/`inode` default to `0` when the active format
/// doesn't report one (Lustre has no fileset concept); the staging
/// table's `(fileset_id, inode)` dedup key degrades to deduping by inode
/// alone in that case, matching the original's GPFS-only fileset usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRecord {
    pub path: String,
    pub depth: i64,
    pub fileset_id: u64,
    pub inode: u64,
}

/// One worker's output for one chunk in Pass 1's directory-discovery
/// mode.
#[derive(Debug, Clone, Default)]
pub struct DirChunkResult {
    pub dirs: Vec<DirRecord>,
    pub lines_in_chunk: usize,
}

/// Depth of a directory path: number of path separators, with the
/// filesystem root itself (`"/"`) pinned to depth `0`.
fn path_depth(path: &str) -> i64 {
    if path == "/" {
        0
    } else {
        i64::try_from(path.matches('/').count()).unwrap_or(i64::MAX)
    }
}

/// Parses one chunk of raw lines into the directory entries it
/// contains, ignoring files. Pure: no I/O, no shared state.
#[must_use]
pub fn parse_dir_chunk(parser: &Parser, lines: &[String]) -> DirChunkResult {
    let mut dirs = Vec::new();
    for line in lines {
        let Some(entry) = parser.parse_line(line) else {
            continue;
        };
        if !entry.is_dir {
            continue;
        }
        let depth = path_depth(&entry.path);
        dirs.push(DirRecord {
            path: entry.path,
            depth,
            fileset_id: entry.fileset_id.unwrap_or(0),
            inode: entry.inode.unwrap_or(0),
        });
    }
    DirChunkResult {
        dirs,
        lines_in_chunk: lines.len(),
    }
}

/// Parses one chunk of raw lines into non-recursive directory deltas and
/// per-uid histogram deltas (Pass 2a), ignoring directory entries.
/// `scan_date` drives age-bucket classification; its absence puts every
/// entry in the oldest populated bucket (SPEC_FULL §10, degraded mode).
#[must_use]
pub fn parse_file_chunk(
    parser: &Parser,
    lines: &[String],
    scan_date: Option<chrono::NaiveDate>,
) -> FileChunkResult {
    let mut result = FileChunkResult {
        lines_in_chunk: lines.len(),
        ..Default::default()
    };

    for line in lines {
        let Some(entry) = parser.parse_line(line) else {
            continue;
        };
        if entry.is_dir {
            continue;
        }

        let atime_bucket = match (entry.atime, scan_date) {
            (Some(atime), Some(scan_date)) => {
                let age_days = (scan_date - atime.date()).num_days().max(0);
                store::classify_atime_bucket(age_days)
            }
            (Some(_), None) | (None, _) => {
                if entry.atime.is_none() {
                    result.timestamp_anomalies += 1;
                }
                store::OLDEST_ATIME_BUCKET
            }
        };
        let size_bucket = store::classify_size_bucket(entry.allocated);

        let delta = result
            .dir_deltas
            .entry(entry.parent_path().to_owned())
            .or_insert_with(DirStatsAccumulator::default);
        delta.nr_count += 1;
        delta.nr_size += entry.allocated;
        delta.nr_atime_max = crate::accumulator::max_atime(delta.nr_atime_max, entry.atime);
        delta.owner_uid = delta.owner_uid.observe(entry.uid);
        delta.owner_gid = delta.owner_gid.observe(entry.gid);

        let hist = result
            .hist_deltas
            .entry(entry.uid)
            .or_insert_with(HistAccumulator::default);
        hist.record(atime_bucket, size_bucket, entry.allocated);
    }

    result
}

/// Streams `reader` through `queue_depth`-bounded backpressure into a
/// `rayon` scope, applying `parse_chunk` to each chunk and handing every
/// worker's output to `consume` as soon as it is ready, on the calling
/// thread -- `consume` never runs concurrently with itself, so a caller
/// that needs to merge chunk results into a shared accumulator (Pass 2a's
/// `by_dir`) can do so without its own locking.
///
/// On a `consume` error the remaining in-flight results are drained
/// (without being passed to `consume` again) so the producer and worker
/// threads can still drain their channels and exit cleanly, then the
/// first error is returned.
pub fn run_chunked_with<T, F, C>(
    mut reader: ChunkedReader,
    pool: &rayon::ThreadPool,
    queue_depth: usize,
    parse_chunk: F,
    mut consume: C,
) -> IngestResult<()>
where
    T: Send,
    F: Fn(&[String]) -> T + Sync,
    C: FnMut(T) -> IngestResult<()>,
{
    let (line_tx, line_rx) = bounded::<Vec<String>>(queue_depth);
    let (result_tx, result_rx) = bounded::<T>(queue_depth);

    thread::scope(|scope| {
        let producer = scope.spawn(move || -> IngestResult<()> {
            for chunk in &mut reader {
                let lines = chunk.map_err(IngestError::from)?;
                if line_tx.send(lines).is_err() {
                    break;
                }
            }
            Ok(())
        });

        let workers = scope.spawn(move || {
            pool.install(|| {
                line_rx.into_iter().par_bridge().for_each(|lines| {
                    let _ = result_tx.send(parse_chunk(&lines));
                });
            });
        });

        let mut first_err = None;
        for result in result_rx.iter() {
            if first_err.is_none() {
                if let Err(err) = consume(result) {
                    first_err = Some(err);
                }
            }
        }

        producer
            .join()
            .map_err(|_| IngestError::Worker("chunk producer thread panicked".to_owned()))??;
        workers
            .join()
            .map_err(|_| IngestError::Worker("worker pool thread panicked".to_owned()))?;

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    })
}

/// Convenience wrapper over [`run_chunked_with`] for callers that just
/// want every worker's output collected, with no need to act on a chunk
/// before the whole input has been read -- Pass 1's directory discovery,
/// which must see the entire tree before it can materialize it.
pub fn run_chunked<T, F>(
    reader: ChunkedReader,
    pool: &rayon::ThreadPool,
    queue_depth: usize,
    parse_chunk: F,
) -> IngestResult<Vec<T>>
where
    T: Send,
    F: Fn(&[String]) -> T + Sync,
{
    let mut results = Vec::new();
    run_chunked_with(reader, pool, queue_depth, parse_chunk, |result| {
        results.push(result);
        Ok(())
    })?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsers::GpfsParser;

    fn gpfs() -> Parser {
        Parser::Gpfs(GpfsParser)
    }

    #[test]
    fn path_depth_pins_root_to_zero() {
        assert_eq!(path_depth("/"), 0);
        assert_eq!(path_depth("/a"), 1);
        assert_eq!(path_depth("/a/b"), 2);
    }

    #[test]
    fn run_chunked_processes_every_chunk_in_order_independent_fashion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.list");
        std::fs::write(&path, "line one\nline two\nline three\n").unwrap();
        let reader = ChunkedReader::open(&path, 8).unwrap();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .unwrap();
        let results = run_chunked(reader, &pool, 4, |lines| lines.len()).unwrap();
        let total: usize = results.into_iter().sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn parse_dir_chunk_skips_files() {
        let lines = vec![
            "<0> 1 7 0 p=drwxr-xr-x -- /a/b".to_owned(),
            "<0> 2 7 0 s=4096 a=4 u=100 g=100 p=-rw-r--r-- -- /a/b/f".to_owned(),
        ];
        let result = parse_dir_chunk(&gpfs(), &lines);
        assert_eq!(result.lines_in_chunk, 2);
        assert_eq!(result.dirs.len(), 1);
        assert_eq!(result.dirs[0].path, "/a/b");
        assert_eq!(result.dirs[0].fileset_id, 7);
    }
}
