use rusqlite::Connection;

use crate::error::StoreResult;

/// Applies the write-optimized pragma set used for the duration of an
/// ingest run. These trade durability for throughput: a crash mid-run
/// leaves the store unspecified-but-replaceable (§7 propagation
/// policy), which the importer already treats as the retry path.
pub fn configure_for_ingest(conn: &Connection) -> StoreResult<()> {
    conn.pragma_update(None, "synchronous", "OFF")?;
    conn.pragma_update(None, "journal_mode", "MEMORY")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "cache_size", -64_000_i64)?;
    conn.pragma_update(None, "mmap_size", 30_000_000_000_i64)?;
    conn.pragma_update(None, "busy_timeout", 30_000_i64)?;
    conn.pragma_update(None, "locking_mode", "EXCLUSIVE")?;
    Ok(())
}

/// Runs at the end of a successful ingest: refreshes the query planner
/// statistics used by downstream query-serving consumers. Transaction
/// boundaries are the caller's responsibility (each pass/depth commits
/// its own unit of work).
pub fn finalize_after_ingest(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch("PRAGMA optimize;")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pragmas_apply_without_error_on_a_fresh_connection() {
        let conn = Connection::open_in_memory().unwrap();
        configure_for_ingest(&conn).unwrap();
    }
}
