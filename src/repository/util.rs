//! Error helpers for the SQLite layer.

use diesel::result::{ConnectionError, DatabaseErrorInformation, DatabaseErrorKind};

use super::DieselError;

/// A failed `establish`, carried inside a query error so every repository
/// method returns the same error type.
#[derive(Debug)]
struct ConnectionFailure {
    message: String,
    database_url: String,
}

impl DatabaseErrorInformation for ConnectionFailure {
    fn message(&self) -> &str {
        &self.message
    }
    fn details(&self) -> Option<&str> {
        Some(&self.database_url)
    }
    fn hint(&self) -> Option<&str> {
        None
    }
    fn table_name(&self) -> Option<&str> {
        None
    }
    fn column_name(&self) -> Option<&str> {
        None
    }
    fn constraint_name(&self) -> Option<&str> {
        None
    }
    fn statement_position(&self) -> Option<i32> {
        None
    }
}

/// Wrap a connection failure for `database_url`.
pub fn connection_error(database_url: &str, e: ConnectionError) -> DieselError {
    DieselError::DatabaseError(
        DatabaseErrorKind::UnableToSendCommand,
        Box::new(ConnectionFailure {
            message: format!("cannot open {}: {}", database_url, e),
            database_url: database_url.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_keeps_url() {
        let err = connection_error(
            "/nowhere/harvester.db",
            ConnectionError::BadConnection("unable to open".to_string()),
        );
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UnableToSendCommand, info) => {
                assert_eq!(info.details(), Some("/nowhere/harvester.db"));
                assert!(info.message().contains("unable to open"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
