//! Domain error shared by the user, scheduling and treatment services.

use crate::db::DatabaseError;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl ClinicError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DatabaseError> for ClinicError {
    fn from(err: DatabaseError) -> Self {
        if err.is_unique_violation() {
            return ClinicError::Conflict(err.to_string());
        }
        match err {
            DatabaseError::NotFound { entity_type, id } => ClinicError::NotFound {
                entity: entity_type,
                id,
            },
            other => ClinicError::Database(other),
        }
    }
}

impl From<rusqlite::Error> for ClinicError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_not_found_keeps_entity() {
        let err: ClinicError = DatabaseError::NotFound {
            entity_type: "User".into(),
            id: "7".into(),
        }
        .into();
        assert_eq!(err.to_string(), "User not found: 7");
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let db_err: DatabaseError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(matches!(ClinicError::from(db_err), ClinicError::Conflict(_)));
    }
}
