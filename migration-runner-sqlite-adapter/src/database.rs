use crate::config::SqliteConfig;
use crate::migrator::{SharedConnection, SqliteMigrator};
use crate::wrapper::{quote_identifier, to_runner_error};
use migration_runner::errors::{ErrorKind, RunnerError, RunnerResult};
use migration_runner::{DatabaseProvider, LedgerSchema};
use parking_lot::ReentrantMutex;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;

/// SQLite implementation of [`DatabaseProvider`].
///
/// A single connection is shared between the provider and every
/// [`SqliteMigrator`] it hands out, so the ledger writes and the schema edits
/// of one change-unit happen inside the same transaction.
///
/// # Examples
///
/// ```rust,ignore
/// use migration_runner::MigrationRunner;
/// use migration_runner_sqlite_adapter::SqliteDatabase;
///
/// let db = SqliteDatabase::with_config()
///     .db_path("/path/to/app.db")
///     .build()?;
/// let runner = MigrationRunner::builder(db)
///     .migrations_dir("/path/to/migrations")
///     .build()?;
/// runner.run()?;
/// ```
#[derive(Clone)]
pub struct SqliteDatabase {
    inner: Arc<SqliteDatabaseInner>,
}

impl SqliteDatabase {
    /// Creates a builder for configuring a SQLite database.
    #[inline]
    pub fn with_config() -> SqliteDatabaseBuilder {
        SqliteDatabaseBuilder::new()
    }

    /// Opens (or creates) the database file at `path` with default settings.
    pub fn open(path: &str) -> RunnerResult<SqliteDatabase> {
        SqliteDatabase::with_config().db_path(path).build()
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> RunnerResult<SqliteDatabase> {
        SqliteDatabase::with_config().build()
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.inner.config
    }

    /// Whether a transaction is currently open on the connection.
    pub fn in_transaction(&self) -> bool {
        !self.inner.connection.lock().is_autocommit()
    }

    fn new(config: SqliteConfig) -> RunnerResult<SqliteDatabase> {
        let inner = SqliteDatabaseInner::open(config)?;
        Ok(SqliteDatabase {
            inner: Arc::new(inner),
        })
    }
}

impl DatabaseProvider for SqliteDatabase {
    type Migrator = SqliteMigrator;

    fn begin_transaction(&self) -> RunnerResult<()> {
        self.inner.begin_transaction()
    }

    fn commit(&self) -> RunnerResult<()> {
        self.inner.commit()
    }

    fn rollback(&self) -> RunnerResult<()> {
        self.inner.rollback()
    }

    fn create_table_if_absent(&self, schema: &LedgerSchema) -> RunnerResult<()> {
        self.inner.create_table_if_absent(schema)
    }

    fn migrator(&self) -> RunnerResult<SqliteMigrator> {
        Ok(SqliteMigrator::new(self.inner.connection.clone()))
    }

    fn insert_record(&self, schema: &LedgerSchema, name: &str) -> RunnerResult<()> {
        self.inner.insert_record(schema, name)
    }

    fn delete_record(&self, schema: &LedgerSchema, name: &str) -> RunnerResult<bool> {
        self.inner.delete_record(schema, name)
    }

    fn record_names(&self, schema: &LedgerSchema) -> RunnerResult<Vec<String>> {
        self.inner.record_names(schema)
    }
}

struct SqliteDatabaseInner {
    connection: SharedConnection,
    config: SqliteConfig,
}

impl SqliteDatabaseInner {
    fn open(config: SqliteConfig) -> RunnerResult<SqliteDatabaseInner> {
        config.validate()?;

        let connection = match config.db_path() {
            Some(path) => {
                log::debug!("Opening SQLite database at {}", path);
                Connection::open(path)
            }
            None => {
                log::debug!("Opening in-memory SQLite database");
                Connection::open_in_memory()
            }
        }
        .map_err(|err| {
            log::error!("Failed to open SQLite database: {}", err);
            to_runner_error(err)
        })?;

        connection
            .busy_timeout(config.busy_timeout())
            .map_err(to_runner_error)?;
        connection
            .pragma_update(None, "foreign_keys", config.foreign_keys())
            .map_err(to_runner_error)?;

        Ok(SqliteDatabaseInner {
            connection: Arc::new(ReentrantMutex::new(connection)),
            config,
        })
    }

    fn begin_transaction(&self) -> RunnerResult<()> {
        let connection = self.connection.lock();
        if !connection.is_autocommit() {
            log::error!("Cannot begin a transaction while another one is open");
            return Err(RunnerError::new(
                "A transaction is already open",
                ErrorKind::BackendError,
            ));
        }
        connection
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(to_runner_error)
    }

    fn commit(&self) -> RunnerResult<()> {
        let connection = self.connection.lock();
        if connection.is_autocommit() {
            log::error!("Commit called without an open transaction");
            return Err(RunnerError::new(
                "No open transaction to commit",
                ErrorKind::BackendError,
            ));
        }
        connection.execute_batch("COMMIT").map_err(to_runner_error)
    }

    fn rollback(&self) -> RunnerResult<()> {
        let connection = self.connection.lock();
        if connection.is_autocommit() {
            // sqlite may already have rolled back on its own after an error
            log::debug!("Rollback requested but no transaction is open");
            return Ok(());
        }
        connection.execute_batch("ROLLBACK").map_err(to_runner_error)
    }

    fn create_table_if_absent(&self, schema: &LedgerSchema) -> RunnerResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({} VARCHAR(255) NOT NULL PRIMARY KEY)",
            quote_identifier(schema.table_name()),
            quote_identifier(schema.column_name()),
        );
        let connection = self.connection.lock();
        connection.execute_batch(&sql).map_err(|err| {
            log::error!(
                "Failed to create ledger table {}: {}",
                schema.table_name(),
                err
            );
            to_runner_error(err)
        })
    }

    fn insert_record(&self, schema: &LedgerSchema, name: &str) -> RunnerResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?1)",
            quote_identifier(schema.table_name()),
            quote_identifier(schema.column_name()),
        );
        let connection = self.connection.lock();
        connection
            .execute(&sql, [name])
            .map(|_| ())
            .map_err(to_runner_error)
    }

    fn delete_record(&self, schema: &LedgerSchema, name: &str) -> RunnerResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_identifier(schema.table_name()),
            quote_identifier(schema.column_name()),
        );
        let connection = self.connection.lock();
        connection
            .execute(&sql, [name])
            .map(|changed| changed > 0)
            .map_err(to_runner_error)
    }

    fn record_names(&self, schema: &LedgerSchema) -> RunnerResult<Vec<String>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            quote_identifier(schema.column_name()),
            quote_identifier(schema.table_name()),
            quote_identifier(schema.column_name()),
        );
        let connection = self.connection.lock();
        let mut stmt = connection.prepare(&sql).map_err(to_runner_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(to_runner_error)?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(to_runner_error)
    }
}

/// Builder for [`SqliteDatabase`].
pub struct SqliteDatabaseBuilder {
    config: SqliteConfig,
}

impl SqliteDatabaseBuilder {
    #[inline]
    pub fn new() -> SqliteDatabaseBuilder {
        SqliteDatabaseBuilder {
            config: SqliteConfig::new(),
        }
    }

    /// Path of the database file. Leave unset for an in-memory database.
    #[inline]
    pub fn db_path(mut self, db_path: &str) -> Self {
        self.config.set_db_path(db_path);
        self
    }

    #[inline]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.config.set_busy_timeout(timeout);
        self
    }

    #[inline]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.config.set_foreign_keys(enabled);
        self
    }

    /// Validates the configuration and opens the connection.
    pub fn build(self) -> RunnerResult<SqliteDatabase> {
        SqliteDatabase::new(self.config)
    }
}

impl Default for SqliteDatabaseBuilder {
    fn default() -> Self {
        SqliteDatabaseBuilder::new()
    }
}
