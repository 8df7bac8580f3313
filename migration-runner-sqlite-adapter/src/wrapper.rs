use migration_runner::errors::{ErrorKind, RunnerError};
use std::error::Error;
use thiserror::Error;

/// Configuration problems detected while building a [`SqliteDatabase`](crate::SqliteDatabase).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SqliteConfigError {
    /// An empty string was given as database path
    #[error("Database path cannot be empty")]
    EmptyPath,
    /// The directory that should contain the database file is missing
    #[error("Parent directory of {0} does not exist")]
    MissingParent(String),
}

impl From<SqliteConfigError> for RunnerError {
    fn from(err: SqliteConfigError) -> Self {
        RunnerError::new(&err.to_string(), ErrorKind::ConfigError)
    }
}

/// Converts a driver error into a [`RunnerError`] of kind `BackendError`.
pub(crate) fn to_runner_error(error: impl Error) -> RunnerError {
    RunnerError::new(&format!("SQLite Error: {}", error), ErrorKind::BackendError)
}

/// Quotes an SQL identifier, doubling embedded quotes.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
