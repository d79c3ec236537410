//! Transport-agnostic application state.
//!
//! Holds the database location and hands out one connection per request.
//! Connections are never shared between tasks.

use std::path::{Path, PathBuf};

use crate::db;

pub struct CoreState {
    db_path: PathBuf,
}

impl CoreState {
    /// Create the state and make sure the schema is current.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::DataDir(format!("{}: {e}", parent.display())))?;
            }
        }
        // Opening runs pending migrations once at startup
        db::open_database(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database ready");
        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a fresh connection with pragmas applied.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Data directory error: {0}")]
    DataDir(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_parent_and_schema() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("clinic.db");
        let core = CoreState::new(&path).unwrap();
        assert!(path.exists());
        assert_eq!(core.db_path(), path.as_path());

        let conn = core.open_db().unwrap();
        assert_eq!(db::get_current_version(&conn), 3);
    }

    #[test]
    fn connections_are_independent() {
        let tmp = tempfile::tempdir().unwrap();
        let core = CoreState::new(tmp.path().join("clinic.db")).unwrap();
        let a = core.open_db().unwrap();
        let b = core.open_db().unwrap();
        a.execute(
            "INSERT INTO treatments (name, description) VALUES ('Rest', '')",
            [],
        )
        .unwrap();
        let count: i64 = b
            .query_row("SELECT COUNT(*) FROM treatments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
