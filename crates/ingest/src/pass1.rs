//! Pass 1: directory discovery (spec.md §4.4).
//!
//! Every directory entry in the scan log is deduplicated by
//! `(fileset_id, inode)` in a staging table (hardlinked directories don't
//! exist on POSIX filesystems, but GPFS/Lustre scan tools can still emit
//! the same inode twice across snapshot boundaries), then materialized
//! into the `directories` table in depth-ascending order so every row's
//! parent already has a `dir_id` by the time it's needed.

use std::collections::HashMap;

use rusqlite::params;
use tracing::{debug, info};

use parsers::Parser;
use reader::ChunkedReader;
use store::Store;

use crate::error::IngestResult;
use crate::worker::{parse_dir_chunk, run_chunked};

/// The parent path of `path` under the same convention as
/// `ParsedEntry::parent_path`: the filesystem root's parent is itself
/// (detected separately), and a top-level entry's parent is `"/"`.
fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// The final path component of `path`.
fn name_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Runs Pass 1 over `reader`, materializing every discovered directory
/// into `store`'s `directories` table and returning a path -> `dir_id`
/// map for Pass 2a/2b to resolve non-recursive deltas against.
///
/// # Errors
///
/// Returns [`crate::IngestError`] if the input can't be read or a SQL
/// statement fails.
pub fn discover_directories(
    reader: ChunkedReader,
    parser: &Parser,
    pool: &rayon::ThreadPool,
    queue_depth: usize,
    store: &mut Store,
) -> IngestResult<HashMap<String, i64>> {
    info!("pass 1: discovering directories");

    let chunk_results = run_chunked(reader, pool, queue_depth, |lines| {
        parse_dir_chunk(parser, lines)
    })?;

    store::create_staging_dirs(store.connection())?;

    {
        let conn = store.connection_mut();
        let tx = conn.transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO staging_dirs (fileset_id, inode, depth, path) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for chunk in &chunk_results {
                for dir in &chunk.dirs {
                    insert.execute(params![dir.fileset_id, dir.inode, dir.depth, dir.path])?;
                }
            }
        }
        tx.commit()?;
    }

    let path_to_id = materialize_tree(store)?;

    store::drop_staging_dirs(store.connection())?;

    let lines_total: usize = chunk_results.iter().map(|c| c.lines_in_chunk).sum();
    debug!(
        lines_total,
        directories = path_to_id.len(),
        "pass 1 complete"
    );

    Ok(path_to_id)
}

/// Reads `staging_dirs` in depth-ascending order and inserts each
/// distinct path into `directories`, resolving `parent_id` from rows
/// already inserted at a shallower depth. A directory whose parent was
/// never itself announced (the scan started below the true filesystem
/// root, or a disjoint subtree was concatenated into the same log) is
/// treated as a tree root in its own right rather than a hard error.
///
/// Every directory also gets its `directory_stats` row created here,
/// with `dir_count_nr` incremented on its parent: subdirectory counts
/// are known the moment the tree is materialized, unlike file-derived
/// statistics which Pass 2a discovers by scanning file entries.
fn materialize_tree(store: &mut Store) -> IngestResult<HashMap<String, i64>> {
    let mut path_to_id: HashMap<String, i64> = HashMap::new();
    let conn = store.connection_mut();
    let tx = conn.transaction()?;
    {
        let rows: Vec<(String, i64)> = {
            let mut select =
                tx.prepare("SELECT DISTINCT path, depth FROM staging_dirs ORDER BY depth ASC")?;
            let mapped =
                select.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            mapped.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut insert =
            tx.prepare("INSERT INTO directories (parent_id, name, depth) VALUES (?1, ?2, ?3)")?;
        let mut insert_stats = tx.prepare(
            "INSERT INTO directory_stats (
                dir_id, file_count_nr, total_size_nr, max_atime_nr, dir_count_nr,
                file_count_r, total_size_r, max_atime_r, dir_count_r, owner_uid, owner_gid
             ) VALUES (?1, 0, 0, NULL, 0, 0, 0, NULL, 0, -1, -1)",
        )?;
        let mut bump_parent_dir_count =
            tx.prepare("UPDATE directory_stats SET dir_count_nr = dir_count_nr + 1 WHERE dir_id = ?1")?;

        for (path, depth) in rows {
            if path_to_id.contains_key(&path) {
                continue;
            }
            let (parent_id, name) = if path == "/" {
                (None, String::new())
            } else {
                let parent_id = path_to_id.get(parent_of(&path)).copied();
                (parent_id, name_of(&path).to_owned())
            };
            insert.execute(params![parent_id, name, depth])?;
            let dir_id = tx.last_insert_rowid();
            insert_stats.execute(params![dir_id])?;
            if let Some(parent_id) = parent_id {
                bump_parent_dir_count.execute(params![parent_id])?;
            }
            path_to_id.insert(path, dir_id);
        }
    }
    tx.commit()?;
    Ok(path_to_id)
}
