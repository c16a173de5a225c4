use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::{paths, pragmas, schema};

/// A single filesystem's persisted directory-statistics store.
///
/// The ingest process exclusively owns a `Store` for the duration of a
/// run; query-serving consumers should open the same file read-only
/// after ingest completes.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (creating if absent) the store for `filesystem`, resolving
    /// its path per `explicit_db_path` > `FS_SCAN_DB` >
    /// `{data_dir}/{filesystem}.db`, applies the ingest pragma set, and
    /// initializes the schema. When `replace` is set, any existing
    /// tables are dropped first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError`] if the path cannot be resolved, the
    /// connection cannot be opened, or schema setup fails.
    pub fn open(
        explicit_db_path: Option<&Path>,
        data_dir_override: Option<&Path>,
        filesystem: &str,
        replace: bool,
    ) -> StoreResult<Self> {
        let db_path = paths::resolve_db_path(explicit_db_path, data_dir_override, filesystem)?;
        info!(path = %db_path.display(), "opening filesystem store");

        let conn = Connection::open(&db_path)?;
        pragmas::configure_for_ingest(&conn)?;

        if replace {
            debug!("--replace set, dropping existing tables");
            schema::drop_all(&conn)?;
        }
        schema::init(&conn)?;

        Ok(Self { conn })
    }

    /// Opens an in-memory store, for tests.
    #[must_use]
    pub fn open_in_memory() -> Self {
        let conn = Connection::open_in_memory().expect("in-memory sqlite connection");
        schema::init(&conn).expect("schema init on fresh in-memory db");
        Self { conn }
    }

    /// Direct access to the underlying connection for the ingest
    /// passes, which issue pass-specific SQL the store crate does not
    /// itself need to know about.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Mutable access to the underlying connection, needed to open
    /// transactions.
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Runs end-of-ingest finalization (`PRAGMA optimize`).
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Sqlite`] if the pragma fails.
    pub fn finalize(&self) -> StoreResult<()> {
        pragmas::finalize_after_ingest(&self.conn)
    }
}
