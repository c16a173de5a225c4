//! Pass 2b: recursive aggregation (spec.md §4.6).
//!
//! Every directory's recursive totals are its own non-recursive totals
//! plus the (already-recursive) totals of its direct children, computed
//! bottom-up: deepest directories first, since a parent's children must
//! already carry their final recursive values before the parent can sum
//! them. One transaction per depth level.
//!
//! The owner-lattice `UPDATE` below corrects a bug in
//! `examples/original_source/fs_scans/importers/pass2b.py`'s recursive
//! CTE: the original picks an arbitrary child owner (`MAX(owner_uid)`)
//! and, when it happens to equal the parent's own current `owner_uid`,
//! leaves the parent as a single owner even when `distinct_valid_owners
//! > 1` — i.e. it fails to detect a conflict the children themselves
//! already present. The CASE below checks `uid_conflict`/`distinct_uids`
//! unconditionally in its first branch, before ever comparing against
//! the parent's current value, so a multi-owner child set always wins
//! regardless of what the parent used to hold (spec.md §4.6 step 2).

use rusqlite::params;
use tracing::{debug, info};

use store::Store;

use crate::error::IngestResult;

/// Runs Pass 2b over every directory already populated by Pass 1/2a.
///
/// # Errors
///
/// Returns [`crate::IngestError`] if a SQL statement fails.
pub fn aggregate_recursive(store: &mut Store) -> IngestResult<()> {
    info!("pass 2b: aggregating recursive statistics");

    seed_recursive_with_own_totals(store)?;

    let max_depth: i64 = store.connection().query_row(
        "SELECT COALESCE(MAX(depth), 0) FROM directories",
        [],
        |row| row.get(0),
    )?;

    for depth in (1..=max_depth).rev() {
        aggregate_children_at_depth(store, depth)?;
        debug!(depth, "pass 2b merged one depth level");
    }

    Ok(())
}

/// Base case: every directory starts its recursive totals equal to its
/// own non-recursive totals, then accumulates children on top.
fn seed_recursive_with_own_totals(store: &mut Store) -> IngestResult<()> {
    store.connection().execute_batch(
        "UPDATE directory_stats SET
            file_count_r = file_count_nr,
            total_size_r = total_size_nr,
            max_atime_r = max_atime_nr,
            dir_count_r = dir_count_nr;",
    )?;
    Ok(())
}

/// Folds every directory at `depth` into its parent's recursive totals.
/// Parents not present in `child_agg` (no children at this depth) are
/// untouched, which is correct: they already carry their seeded values
/// or an earlier, deeper merge's result.
fn aggregate_children_at_depth(store: &mut Store, depth: i64) -> IngestResult<()> {
    let conn = store.connection_mut();
    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE directory_stats
         SET
            file_count_r = file_count_r + child_agg.files,
            total_size_r = total_size_r + child_agg.size,
            max_atime_r = CASE
                WHEN max_atime_r IS NULL THEN child_agg.atime
                WHEN child_agg.atime IS NULL THEN max_atime_r
                WHEN max_atime_r >= child_agg.atime THEN max_atime_r
                ELSE child_agg.atime
            END,
            dir_count_r = dir_count_r + child_agg.dirs,
            owner_uid = CASE
                WHEN child_agg.uid_conflict > 0 OR child_agg.distinct_uids > 1 THEN NULL
                WHEN owner_uid = -1 AND child_agg.distinct_uids = 0 THEN -1
                WHEN owner_uid = -1 THEN child_agg.common_uid
                WHEN owner_uid IS NULL THEN NULL
                WHEN child_agg.distinct_uids = 1 AND child_agg.common_uid != owner_uid THEN NULL
                ELSE owner_uid
            END,
            owner_gid = CASE
                WHEN child_agg.gid_conflict > 0 OR child_agg.distinct_gids > 1 THEN NULL
                WHEN owner_gid = -1 AND child_agg.distinct_gids = 0 THEN -1
                WHEN owner_gid = -1 THEN child_agg.common_gid
                WHEN owner_gid IS NULL THEN NULL
                WHEN child_agg.distinct_gids = 1 AND child_agg.common_gid != owner_gid THEN NULL
                ELSE owner_gid
            END
         FROM (
            SELECT
                d.parent_id AS parent_id,
                SUM(ds.file_count_r) AS files,
                SUM(ds.total_size_r) AS size,
                MAX(ds.max_atime_r) AS atime,
                SUM(ds.dir_count_r) AS dirs,
                COUNT(DISTINCT CASE WHEN ds.owner_uid >= 0 THEN ds.owner_uid END) AS distinct_uids,
                SUM(CASE WHEN ds.owner_uid IS NULL THEN 1 ELSE 0 END) AS uid_conflict,
                MAX(CASE WHEN ds.owner_uid >= 0 THEN ds.owner_uid END) AS common_uid,
                COUNT(DISTINCT CASE WHEN ds.owner_gid >= 0 THEN ds.owner_gid END) AS distinct_gids,
                SUM(CASE WHEN ds.owner_gid IS NULL THEN 1 ELSE 0 END) AS gid_conflict,
                MAX(CASE WHEN ds.owner_gid >= 0 THEN ds.owner_gid END) AS common_gid
            FROM directories d
            JOIN directory_stats ds ON ds.dir_id = d.dir_id
            WHERE d.depth = ?1 AND d.parent_id IS NOT NULL
            GROUP BY d.parent_id
         ) AS child_agg
         WHERE directory_stats.dir_id = child_agg.parent_id",
        params![depth],
    )?;
    tx.commit()?;
    Ok(())
}
