use rusqlite::Connection;

use crate::error::StoreResult;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS directories (
    dir_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id  INTEGER REFERENCES directories(dir_id),
    name       TEXT NOT NULL,
    depth      INTEGER NOT NULL,
    UNIQUE (parent_id, name)
);
CREATE INDEX IF NOT EXISTS ix_directories_parent_id ON directories(parent_id);
CREATE INDEX IF NOT EXISTS ix_directories_depth ON directories(depth);

CREATE TABLE IF NOT EXISTS directory_stats (
    dir_id        INTEGER PRIMARY KEY REFERENCES directories(dir_id),
    file_count_nr INTEGER NOT NULL DEFAULT 0,
    total_size_nr INTEGER NOT NULL DEFAULT 0,
    max_atime_nr  INTEGER,
    dir_count_nr  INTEGER NOT NULL DEFAULT 0,
    file_count_r  INTEGER NOT NULL DEFAULT 0,
    total_size_r  INTEGER NOT NULL DEFAULT 0,
    max_atime_r   INTEGER,
    dir_count_r   INTEGER NOT NULL DEFAULT 0,
    owner_uid     INTEGER DEFAULT -1,
    owner_gid     INTEGER DEFAULT -1
);
CREATE INDEX IF NOT EXISTS ix_stats_total_size_r ON directory_stats(total_size_r);
CREATE INDEX IF NOT EXISTS ix_stats_file_count_r ON directory_stats(file_count_r);
CREATE INDEX IF NOT EXISTS ix_stats_max_atime_r ON directory_stats(max_atime_r);
CREATE INDEX IF NOT EXISTS ix_stats_owner_uid ON directory_stats(owner_uid);
CREATE INDEX IF NOT EXISTS ix_stats_owner_gid ON directory_stats(owner_gid);
CREATE INDEX IF NOT EXISTS ix_stats_owner_size ON directory_stats(owner_uid, total_size_r);
CREATE INDEX IF NOT EXISTS ix_stats_owner_files ON directory_stats(owner_uid, file_count_r);
CREATE INDEX IF NOT EXISTS ix_stats_group_size ON directory_stats(owner_gid, total_size_r);
CREATE INDEX IF NOT EXISTS ix_stats_group_files ON directory_stats(owner_gid, file_count_r);

CREATE TABLE IF NOT EXISTS access_histogram (
    owner_uid   INTEGER NOT NULL,
    bucket_index INTEGER NOT NULL,
    file_count  INTEGER NOT NULL DEFAULT 0,
    total_size  INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (owner_uid, bucket_index)
);
CREATE INDEX IF NOT EXISTS ix_access_hist_owner ON access_histogram(owner_uid);
CREATE INDEX IF NOT EXISTS ix_access_hist_bucket ON access_histogram(bucket_index);

CREATE TABLE IF NOT EXISTS size_histogram (
    owner_uid   INTEGER NOT NULL,
    bucket_index INTEGER NOT NULL,
    file_count  INTEGER NOT NULL DEFAULT 0,
    total_size  INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (owner_uid, bucket_index)
);
CREATE INDEX IF NOT EXISTS ix_size_hist_owner ON size_histogram(owner_uid);
CREATE INDEX IF NOT EXISTS ix_size_hist_bucket ON size_histogram(bucket_index);

CREATE TABLE IF NOT EXISTS owner_summary (
    owner_uid      INTEGER PRIMARY KEY,
    total_size     INTEGER NOT NULL DEFAULT 0,
    total_files    INTEGER NOT NULL DEFAULT 0,
    directory_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS group_summary (
    owner_gid      INTEGER PRIMARY KEY,
    total_size     INTEGER NOT NULL DEFAULT 0,
    total_files    INTEGER NOT NULL DEFAULT 0,
    directory_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS user_info (
    uid       INTEGER PRIMARY KEY,
    username  TEXT,
    full_name TEXT
);

CREATE TABLE IF NOT EXISTS group_info (
    gid       INTEGER PRIMARY KEY,
    groupname TEXT
);

CREATE TABLE IF NOT EXISTS scan_metadata (
    scan_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    source_file      TEXT NOT NULL,
    scan_timestamp   TEXT,
    import_timestamp TEXT NOT NULL,
    filesystem       TEXT NOT NULL,
    total_directories INTEGER NOT NULL,
    total_files       INTEGER NOT NULL,
    total_size        INTEGER NOT NULL
);
";

/// Creates every table and index if absent. Idempotent: safe to call on
/// an already-initialized store.
///
/// # Errors
///
/// Returns [`crate::StoreError::Sqlite`] if any DDL statement fails.
pub fn init(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Drops every table, in dependency order, so a subsequent [`init`]
/// starts from an empty store. Used by `--replace`.
///
/// # Errors
///
/// Returns [`crate::StoreError::Sqlite`] if any `DROP TABLE` fails.
pub fn drop_all(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS scan_metadata;
        DROP TABLE IF EXISTS group_info;
        DROP TABLE IF EXISTS user_info;
        DROP TABLE IF EXISTS group_summary;
        DROP TABLE IF EXISTS owner_summary;
        DROP TABLE IF EXISTS size_histogram;
        DROP TABLE IF EXISTS access_histogram;
        DROP TABLE IF EXISTS directory_stats;
        DROP TABLE IF EXISTS directories;
        ",
    )?;
    Ok(())
}
