use rusqlite::Connection;

use crate::error::StoreResult;

/// Creates the Pass 1 staging table: deduplicates directory entries by
/// `(fileset_id, inode)` before they're depth-sorted and inserted into
/// `directories`. Dropped at the end of Pass 1.
///
/// # Errors
///
/// Returns [`crate::StoreError::Sqlite`] if the `CREATE TABLE` fails.
pub fn create_staging_dirs(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TEMP TABLE IF NOT EXISTS staging_dirs (
            fileset_id INTEGER NOT NULL,
            inode      INTEGER NOT NULL,
            depth      INTEGER NOT NULL,
            path       TEXT NOT NULL,
            PRIMARY KEY (fileset_id, inode)
        )",
    )?;
    Ok(())
}

/// Drops the Pass 1 staging table once directory discovery is complete.
///
/// # Errors
///
/// Returns [`crate::StoreError::Sqlite`] if the `DROP TABLE` fails.
pub fn drop_staging_dirs(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch("DROP TABLE IF EXISTS staging_dirs")?;
    Ok(())
}
