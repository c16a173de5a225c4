use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

const DATA_DIR_ENV: &str = "FS_SCAN_DATA_DIR";
const DB_PATH_ENV: &str = "FS_SCAN_DB";

/// Default data directory when neither an explicit flag nor
/// `FS_SCAN_DATA_DIR` is set.
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Resolves the data directory: explicit flag > `FS_SCAN_DATA_DIR` >
/// default. Creates the directory if it doesn't exist.
///
/// # Errors
///
/// Returns [`StoreError::DataDir`] if the directory cannot be created.
pub fn resolve_data_dir(explicit: Option<&Path>) -> StoreResult<PathBuf> {
    let data_dir = explicit.map(Path::to_path_buf).unwrap_or_else(|| {
        env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir)
    });

    fs::create_dir_all(&data_dir).map_err(|source| StoreError::DataDir {
        path: data_dir.clone(),
        source,
    })?;

    Ok(data_dir)
}

/// Resolves the SQLite database path for `filesystem`: explicit flag >
/// `FS_SCAN_DB` > `{data_dir}/{filesystem}.db`.
///
/// # Errors
///
/// Returns [`StoreError::DataDir`] if the data directory needs creating
/// and cannot be.
pub fn resolve_db_path(
    explicit: Option<&Path>,
    data_dir_override: Option<&Path>,
    filesystem: &str,
) -> StoreResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(env_path) = env::var_os(DB_PATH_ENV) {
        return Ok(PathBuf::from(env_path));
    }
    let data_dir = resolve_data_dir(data_dir_override)?;
    Ok(data_dir.join(format!("{filesystem}.db")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn explicit_flag_wins_over_env_and_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit");
        let resolved = resolve_data_dir(Some(&explicit)).unwrap();
        assert_eq!(resolved, explicit);
        assert!(explicit.is_dir());
    }

    #[test]
    fn env_var_wins_over_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let env_dir = dir.path().join("from-env");
        unsafe {
            env::set_var(DATA_DIR_ENV, &env_dir);
        }
        let resolved = resolve_data_dir(None).unwrap();
        unsafe {
            env::remove_var(DATA_DIR_ENV);
        }
        assert_eq!(resolved, env_dir);
    }

    #[test]
    fn db_path_explicit_flag_wins() {
        let _guard = ENV_LOCK.lock().unwrap();
        let explicit = PathBuf::from("/tmp/explicit.db");
        let resolved = resolve_db_path(Some(&explicit), None, "ignored").unwrap();
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn db_path_defaults_to_data_dir_slash_filesystem() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let resolved = resolve_db_path(None, Some(&data_dir), "asp").unwrap();
        assert_eq!(resolved, data_dir.join("asp.db"));
    }
}
