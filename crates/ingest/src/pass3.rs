//! Pass 3: summaries and scan metadata (spec.md §4.7).
//!
//! Unlike Passes 1/2a/2b this pass touches no worker pool: it is a
//! handful of set-based queries plus a host passwd/group lookup per
//! distinct uid/gid, grounded in
//! `examples/original_source/fs_scans/importers/pass3.py`'s
//! `pass3_populate_summary_tables` (phases 3a/3b/3c below keep that
//! naming).

use chrono::{NaiveDate, Utc};
use rusqlite::params;
use tracing::{debug, info};

use store::Store;

use crate::error::IngestResult;

/// Counters produced by Pass 3, folded into [`crate::IngestReport`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Pass3Summary {
    pub host_lookup_misses: u64,
}

/// Runs Pass 3 over a store that has already completed Passes 1/2a/2b:
/// resolves owner identifiers to names (phase 3a), recomputes owner/group
/// summaries (phase 3b), and records one `scan_metadata` row (phase 3c).
///
/// # Errors
///
/// Returns [`crate::IngestError`] if a SQL statement fails.
pub fn summarize(
    store: &mut Store,
    source_file: &str,
    filesystem: &str,
    scan_timestamp: Option<NaiveDate>,
) -> IngestResult<Pass3Summary> {
    info!("pass 3: populating summary tables");

    let mut summary = Pass3Summary::default();
    summary.host_lookup_misses += resolve_user_info(store)?;
    summary.host_lookup_misses += resolve_group_info(store)?;
    populate_owner_summary(store)?;
    populate_group_summary(store)?;
    record_scan_metadata(store, source_file, filesystem, scan_timestamp)?;

    debug!(
        host_lookup_misses = summary.host_lookup_misses,
        "pass 3 complete"
    );
    Ok(summary)
}

/// Phase 3a (uid half): every distinct valid `owner_uid` in
/// `directory_stats` is resolved via the host's passwd database and
/// upserted into `user_info`. A lookup miss writes a row with `username`
/// absent rather than failing the run (spec.md §7 `HostLookupMiss`).
fn resolve_user_info(store: &mut Store) -> IngestResult<u64> {
    let uids: Vec<i64> = {
        let conn = store.connection();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT owner_uid FROM directory_stats WHERE owner_uid IS NOT NULL AND owner_uid >= 0",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    let mut misses = 0u64;
    let conn = store.connection_mut();
    let tx = conn.transaction()?;
    {
        let mut upsert = tx.prepare(
            "INSERT INTO user_info (uid, username, full_name) VALUES (?1, ?2, ?3)
             ON CONFLICT(uid) DO UPDATE SET username = excluded.username, full_name = excluded.full_name",
        )?;
        for uid in uids {
            let (username, full_name) = lookup_user(uid);
            if username.is_none() {
                misses += 1;
            }
            upsert.execute(params![uid, username, full_name])?;
        }
    }
    tx.commit()?;
    Ok(misses)
}

/// Phase 3a (gid half): mirrors [`resolve_user_info`] against the host
/// group database.
fn resolve_group_info(store: &mut Store) -> IngestResult<u64> {
    let gids: Vec<i64> = {
        let conn = store.connection();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT owner_gid FROM directory_stats WHERE owner_gid IS NOT NULL AND owner_gid >= 0",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    let mut misses = 0u64;
    let conn = store.connection_mut();
    let tx = conn.transaction()?;
    {
        let mut upsert = tx.prepare(
            "INSERT INTO group_info (gid, groupname) VALUES (?1, ?2)
             ON CONFLICT(gid) DO UPDATE SET groupname = excluded.groupname",
        )?;
        for gid in gids {
            let groupname = lookup_group(gid);
            if groupname.is_none() {
                misses += 1;
            }
            upsert.execute(params![gid, groupname])?;
        }
    }
    tx.commit()?;
    Ok(misses)
}

/// Resolves `uid` to `(username, full_name)` via the host passwd
/// database. The GECOS field's first comma-separated token is taken as
/// the full name, matching the original's `pw_gecos.split(",")[0]`.
/// Never fatal: an unresolvable uid yields `(None, None)`.
#[cfg(unix)]
fn lookup_user(uid: i64) -> (Option<String>, Option<String>) {
    let Ok(raw_uid) = u32::try_from(uid) else {
        return (None, None);
    };
    match nix::unistd::User::from_uid(nix::unistd::Uid::from_raw(raw_uid)) {
        Ok(Some(user)) => {
            let full_name = user
                .gecos
                .to_str()
                .ok()
                .and_then(|g| g.split(',').next())
                .filter(|g| !g.is_empty())
                .map(str::to_owned);
            (Some(user.name), full_name)
        }
        _ => (None, None),
    }
}

#[cfg(not(unix))]
fn lookup_user(_uid: i64) -> (Option<String>, Option<String>) {
    (None, None)
}

/// Resolves `gid` to a group name via the host group database. Never
/// fatal: an unresolvable gid yields `None`.
#[cfg(unix)]
fn lookup_group(gid: i64) -> Option<String> {
    let raw_gid = u32::try_from(gid).ok()?;
    nix::unistd::Group::from_gid(nix::unistd::Gid::from_raw(raw_gid))
        .ok()
        .flatten()
        .map(|group| group.name)
}

#[cfg(not(unix))]
fn lookup_group(_gid: i64) -> Option<String> {
    None
}

/// Phase 3b (owner half): recomputed from scratch every run, grouping
/// `directory_stats` on `owner_uid` and summing non-recursive totals
/// plus a contributing-directory count.
fn populate_owner_summary(store: &mut Store) -> IngestResult<()> {
    let conn = store.connection_mut();
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM owner_summary", [])?;
    tx.execute(
        "INSERT INTO owner_summary (owner_uid, total_size, total_files, directory_count)
         SELECT owner_uid, SUM(total_size_nr), SUM(file_count_nr), COUNT(*)
         FROM directory_stats
         WHERE owner_uid IS NOT NULL AND owner_uid >= 0
         GROUP BY owner_uid",
        [],
    )?;
    tx.commit()?;
    Ok(())
}

/// Phase 3b (group half): mirrors [`populate_owner_summary`] against
/// `owner_gid`.
fn populate_group_summary(store: &mut Store) -> IngestResult<()> {
    let conn = store.connection_mut();
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM group_summary", [])?;
    tx.execute(
        "INSERT INTO group_summary (owner_gid, total_size, total_files, directory_count)
         SELECT owner_gid, SUM(total_size_nr), SUM(file_count_nr), COUNT(*)
         FROM directory_stats
         WHERE owner_gid IS NOT NULL AND owner_gid >= 0
         GROUP BY owner_gid",
        [],
    )?;
    tx.commit()?;
    Ok(())
}

/// Phase 3c: a single `scan_metadata` row recording provenance and the
/// tree-wide totals, taken from the sum over root directories' recursive
/// fields (spec.md §4.7).
fn record_scan_metadata(
    store: &mut Store,
    source_file: &str,
    filesystem: &str,
    scan_timestamp: Option<NaiveDate>,
) -> IngestResult<()> {
    let conn = store.connection_mut();
    let (total_directories, total_files, total_size): (i64, i64, i64) = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM directories),
            COALESCE(SUM(s.file_count_r), 0),
            COALESCE(SUM(s.total_size_r), 0)
         FROM directories d
         JOIN directory_stats s ON s.dir_id = d.dir_id
         WHERE d.parent_id IS NULL",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let import_timestamp = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO scan_metadata
            (source_file, scan_timestamp, import_timestamp, filesystem,
             total_directories, total_files, total_size)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            source_file,
            scan_timestamp.map(|d| d.format("%Y-%m-%d").to_string()),
            import_timestamp,
            filesystem,
            total_directories,
            total_files,
            total_size,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use store::Owner;

    fn seed_directory(store: &Store, parent_id: Option<i64>, name: &str, depth: i64) -> i64 {
        store
            .connection()
            .execute(
                "INSERT INTO directories (parent_id, name, depth) VALUES (?1, ?2, ?3)",
                params![parent_id, name, depth],
            )
            .unwrap();
        let dir_id = store.connection().last_insert_rowid();
        store
            .connection()
            .execute(
                "INSERT INTO directory_stats (
                    dir_id, file_count_nr, total_size_nr, max_atime_nr, dir_count_nr,
                    file_count_r, total_size_r, max_atime_r, dir_count_r, owner_uid, owner_gid
                 ) VALUES (?1, 0, 0, NULL, 0, 0, 0, NULL, 0, -1, -1)",
                params![dir_id],
            )
            .unwrap();
        dir_id
    }

    fn set_stats(store: &Store, dir_id: i64, file_count_nr: i64, total_size_nr: i64, owner_uid: Owner) {
        store
            .connection()
            .execute(
                "UPDATE directory_stats SET file_count_nr = ?2, total_size_nr = ?3,
                    file_count_r = ?2, total_size_r = ?3, owner_uid = ?4 WHERE dir_id = ?1",
                params![dir_id, file_count_nr, total_size_nr, owner_uid],
            )
            .unwrap();
    }

    #[test]
    fn owner_summary_groups_by_uid_excluding_unseen_and_multiple() {
        let mut store = Store::open_in_memory();
        let root = seed_directory(&store, None, "", 0);
        let a = seed_directory(&store, Some(root), "a", 1);
        set_stats(&store, root, 0, 0, Owner::Unseen);
        set_stats(&store, a, 3, 300, Owner::Single(42));

        populate_owner_summary(&mut store).unwrap();

        let (files, size, dirs): (i64, i64, i64) = store
            .connection()
            .query_row(
                "SELECT total_files, total_size, directory_count FROM owner_summary WHERE owner_uid = 42",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(files, 3);
        assert_eq!(size, 300);
        assert_eq!(dirs, 1);

        let unseen_rows: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM owner_summary WHERE owner_uid = -1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(unseen_rows, 0);
    }

    #[test]
    fn owner_summary_is_recomputed_not_accumulated_across_runs() {
        let mut store = Store::open_in_memory();
        let root = seed_directory(&store, None, "", 0);
        set_stats(&store, root, 1, 100, Owner::Single(7));
        populate_owner_summary(&mut store).unwrap();
        populate_owner_summary(&mut store).unwrap();

        let files: i64 = store
            .connection()
            .query_row(
                "SELECT total_files FROM owner_summary WHERE owner_uid = 7",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(files, 1);
    }

    #[test]
    fn scan_metadata_totals_come_from_root_directories() {
        let mut store = Store::open_in_memory();
        let root = seed_directory(&store, None, "", 0);
        let child = seed_directory(&store, Some(root), "a", 1);
        store
            .connection()
            .execute(
                "UPDATE directory_stats SET file_count_r = 5, total_size_r = 500 WHERE dir_id = ?1",
                params![root],
            )
            .unwrap();
        store
            .connection()
            .execute(
                "UPDATE directory_stats SET file_count_r = 2, total_size_r = 200 WHERE dir_id = ?1",
                params![child],
            )
            .unwrap();

        record_scan_metadata(&mut store, "scan.list", "asp", NaiveDate::from_ymd_opt(2026, 1, 11))
            .unwrap();

        let (files, size, dirs): (i64, i64, i64) = store
            .connection()
            .query_row(
                "SELECT total_files, total_size, total_directories FROM scan_metadata",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        // only the root's recursive totals are summed -- the child's
        // total_size_r is not double-counted on top of the root's, since
        // the root's own total_size_r of 500 already includes it.
        assert_eq!(files, 5);
        assert_eq!(size, 500);
        assert_eq!(dirs, 2);
    }

    #[test]
    fn unresolvable_uid_is_not_fatal() {
        let (username, full_name) = lookup_user(i64::from(u32::MAX) + 1);
        assert_eq!(username, None);
        assert_eq!(full_name, None);
    }
}
