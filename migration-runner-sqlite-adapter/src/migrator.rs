use crate::wrapper::to_runner_error;
use migration_runner::errors::RunnerResult;
use parking_lot::ReentrantMutex;
use rusqlite::{Connection, Params};
use std::sync::Arc;

pub(crate) type SharedConnection = Arc<ReentrantMutex<Connection>>;

/// Migrator handle of [`SqliteDatabase`](crate::SqliteDatabase).
///
/// Shares the database's connection, so statements issued here run inside
/// the transaction the runner opened for the current change-unit.
///
/// ```rust
/// use migration_runner::DatabaseProvider;
/// use migration_runner_sqlite_adapter::SqliteDatabase;
///
/// let db = SqliteDatabase::in_memory().unwrap();
/// let migrator = db.migrator().unwrap();
/// migrator.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY)").unwrap();
/// migrator.execute("ALTER TABLE users ADD COLUMN email TEXT", []).unwrap();
/// assert_eq!(migrator.columns("users").unwrap(), vec!["id", "email"]);
/// ```
#[derive(Clone)]
pub struct SqliteMigrator {
    connection: SharedConnection,
}

impl SqliteMigrator {
    pub(crate) fn new(connection: SharedConnection) -> Self {
        SqliteMigrator { connection }
    }

    /// Executes one statement and returns the number of changed rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> RunnerResult<usize> {
        log::debug!("Executing: {}", sql);
        let connection = self.connection.lock();
        connection.execute(sql, params).map_err(|err| {
            log::error!("Statement failed: {}: {}", sql, err);
            to_runner_error(err)
        })
    }

    /// Executes several `;`-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> RunnerResult<()> {
        log::debug!("Executing batch: {}", sql);
        let connection = self.connection.lock();
        connection.execute_batch(sql).map_err(|err| {
            log::error!("Batch failed: {}", err);
            to_runner_error(err)
        })
    }

    /// Column names of `table` in declaration order. Empty if the table does
    /// not exist.
    pub fn columns(&self, table: &str) -> RunnerResult<Vec<String>> {
        self.with_connection(|connection| {
            let mut stmt = connection.prepare("SELECT name FROM pragma_table_info(?1)")?;
            let rows = stmt.query_map([table], |row| row.get::<_, String>(0))?;
            rows.collect()
        })
    }

    /// Names of the user tables in the database, ascending.
    pub fn tables(&self) -> RunnerResult<Vec<String>> {
        self.with_connection(|connection| {
            let mut stmt = connection.prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect()
        })
    }

    /// Runs `f` with the raw `rusqlite` connection.
    ///
    /// The lock is re-entrant, so calling other migrator methods from inside
    /// `f` is allowed.
    pub fn with_connection<R, F>(&self, f: F) -> RunnerResult<R>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<R>,
    {
        let connection = self.connection.lock();
        f(&connection).map_err(to_runner_error)
    }
}
