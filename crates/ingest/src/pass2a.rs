//! Pass 2a: non-recursive per-directory statistics and per-uid
//! histograms (spec.md §4.5).
//!
//! Workers emit deltas keyed by parent *path*; the coordinator resolves
//! each path to the `dir_id` Pass 1 assigned, merges same-directory
//! deltas produced by different workers, and flushes the merged result
//! into `directory_stats`/`access_histogram`/`size_histogram` in
//! `batch_size`-sized groups.
//!
//! The owner-lattice `UPDATE` below deliberately differs from
//! `examples/original_source/fs_scans/importers/pass2a.py`'s
//! `flush_nr_updates`: the original's `CASE` has no guard for "this
//! flush's delta is `Unseen` (a chunk that only touched `nr_dirs`, no
//! files)" and would wrongly flip an already-established single owner to
//! `Multiple` in that case. The first branch here
//! (`excluded.owner_uid = -1 THEN owner_uid`) restores the lattice join
//! `current.join(Unseen) = current` from spec.md §4.5 step 3.

use std::collections::HashMap;

use rusqlite::params;
use tracing::{debug, info, warn};

use parsers::Parser;
use reader::ChunkedReader;
use store::Store;

use crate::accumulator::{DirStatsAccumulator, HistAccumulator};
use crate::error::IngestResult;
use crate::worker::{parse_file_chunk, run_chunked_with};

/// Counters produced by one Pass 2a run, folded into
/// [`crate::IngestReport`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Pass2aSummary {
    pub files_attributed: u64,
    pub files_dropped_anomalous: u64,
    pub timestamp_anomalies: u64,
}

/// Runs Pass 2a over `reader`, updating `store`'s `directory_stats`,
/// `access_histogram`, and `size_histogram` tables.
///
/// # Errors
///
/// Returns [`crate::IngestError`] if the input can't be read or a SQL
/// statement fails.
#[allow(clippy::too_many_arguments)]
pub fn accumulate_nonrecursive(
    reader: ChunkedReader,
    parser: &Parser,
    scan_date: Option<chrono::NaiveDate>,
    pool: &rayon::ThreadPool,
    queue_depth: usize,
    batch_size: usize,
    path_to_id: &HashMap<String, i64>,
    store: &mut Store,
) -> IngestResult<Pass2aSummary> {
    info!("pass 2a: accumulating non-recursive statistics");

    let mut by_dir: HashMap<i64, DirStatsAccumulator> = HashMap::new();
    let mut by_uid: HashMap<u32, HistAccumulator> = HashMap::new();
    let mut summary = Pass2aSummary::default();
    let mut directories_flushed: u64 = 0;

    run_chunked_with(
        reader,
        pool,
        queue_depth,
        |lines| parse_file_chunk(parser, lines, scan_date),
        |chunk| {
            summary.timestamp_anomalies += chunk.timestamp_anomalies;
            for (path, delta) in &chunk.dir_deltas {
                let Some(&dir_id) = path_to_id.get(path) else {
                    warn!(
                        path = %path,
                        "file attributed to a directory never seen in pass 1; dropping"
                    );
                    summary.files_dropped_anomalous += delta.nr_count;
                    continue;
                };
                summary.files_attributed += delta.nr_count;
                by_dir.entry(dir_id).or_default().merge(delta);
            }
            for (uid, delta) in &chunk.hist_deltas {
                by_uid.entry(*uid).or_default().merge(delta);
            }

            // Bound the coordinator's memory to roughly `batch_size`
            // pending directories rather than letting `by_dir` grow over
            // the whole scan: flush and start a fresh map the moment the
            // threshold is reached (spec.md §4.5 step 3).
            if by_dir.len() >= batch_size {
                directories_flushed += by_dir.len() as u64;
                flush_nonrecursive(store, &by_dir, batch_size)?;
                by_dir = HashMap::new();
            }
            Ok(())
        },
    )?;

    directories_flushed += by_dir.len() as u64;
    flush_nonrecursive(store, &by_dir, batch_size)?;
    flush_histograms(store, &by_uid)?;

    debug!(
        directories = directories_flushed,
        files_attributed = summary.files_attributed,
        files_dropped_anomalous = summary.files_dropped_anomalous,
        "pass 2a complete"
    );

    Ok(summary)
}

fn flush_nonrecursive(
    store: &mut Store,
    by_dir: &HashMap<i64, DirStatsAccumulator>,
    batch_size: usize,
) -> IngestResult<()> {
    let entries: Vec<(i64, DirStatsAccumulator)> =
        by_dir.iter().map(|(id, delta)| (*id, delta.clone())).collect();

    for batch in entries.chunks(batch_size.max(1)) {
        let conn = store.connection_mut();
        let tx = conn.transaction()?;
        {
            let mut upsert = tx.prepare(
                "INSERT INTO directory_stats (
                    dir_id, file_count_nr, total_size_nr, max_atime_nr, dir_count_nr,
                    file_count_r, total_size_r, max_atime_r, dir_count_r,
                    owner_uid, owner_gid
                 ) VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, NULL, 0, ?6, ?7)
                 ON CONFLICT(dir_id) DO UPDATE SET
                    file_count_nr = file_count_nr + excluded.file_count_nr,
                    total_size_nr = total_size_nr + excluded.total_size_nr,
                    max_atime_nr = CASE
                        WHEN max_atime_nr IS NULL THEN excluded.max_atime_nr
                        WHEN excluded.max_atime_nr IS NULL THEN max_atime_nr
                        WHEN max_atime_nr >= excluded.max_atime_nr THEN max_atime_nr
                        ELSE excluded.max_atime_nr
                    END,
                    dir_count_nr = dir_count_nr + excluded.dir_count_nr,
                    owner_uid = CASE
                        WHEN excluded.owner_uid = -1 THEN owner_uid
                        WHEN owner_uid = -1 THEN excluded.owner_uid
                        WHEN owner_uid IS NULL OR excluded.owner_uid IS NULL THEN NULL
                        WHEN owner_uid = excluded.owner_uid THEN owner_uid
                        ELSE NULL
                    END,
                    owner_gid = CASE
                        WHEN excluded.owner_gid = -1 THEN owner_gid
                        WHEN owner_gid = -1 THEN excluded.owner_gid
                        WHEN owner_gid IS NULL OR excluded.owner_gid IS NULL THEN NULL
                        WHEN owner_gid = excluded.owner_gid THEN owner_gid
                        ELSE NULL
                    END",
            )?;
            for (dir_id, delta) in batch {
                upsert.execute(params![
                    dir_id,
                    delta.nr_count,
                    delta.nr_size,
                    delta.nr_atime_max.map(|dt| dt.and_utc().timestamp()),
                    delta.nr_dirs,
                    delta.owner_uid,
                    delta.owner_gid,
                ])?;
            }
        }
        tx.commit()?;
    }
    Ok(())
}

fn flush_histograms(store: &mut Store, by_uid: &HashMap<u32, HistAccumulator>) -> IngestResult<()> {
    let conn = store.connection_mut();
    let tx = conn.transaction()?;
    {
        let mut access_upsert = tx.prepare(
            "INSERT INTO access_histogram (owner_uid, bucket_index, file_count, total_size)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(owner_uid, bucket_index) DO UPDATE SET
                file_count = file_count + excluded.file_count,
                total_size = total_size + excluded.total_size",
        )?;
        let mut size_upsert = tx.prepare(
            "INSERT INTO size_histogram (owner_uid, bucket_index, file_count, total_size)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(owner_uid, bucket_index) DO UPDATE SET
                file_count = file_count + excluded.file_count,
                total_size = total_size + excluded.total_size",
        )?;
        for (uid, hist) in by_uid {
            for bucket in 0..store::BUCKET_COUNT {
                if hist.atime_count[bucket] > 0 {
                    access_upsert.execute(params![
                        uid,
                        bucket as i64,
                        hist.atime_count[bucket],
                        hist.atime_size[bucket]
                    ])?;
                }
                if hist.size_count[bucket] > 0 {
                    size_upsert.execute(params![
                        uid,
                        bucket as i64,
                        hist.size_count[bucket],
                        hist.size_size[bucket]
                    ])?;
                }
            }
        }
    }
    tx.commit()?;
    Ok(())
}
