use crate::database::DatabaseProvider;
use crate::errors::{RunnerError, RunnerResult};
use crate::runner::MigrationRunner;
use crate::runner_config::RunnerConfig;
use crate::unit::{ChangeUnit, UnitRegistry};
use std::path::Path;

/// Builder for a [`MigrationRunner`].
///
/// Setters never fail directly: the first configuration error is kept and
/// returned from [`MigrationRunnerBuilder::build`].
///
/// # Examples
///
/// ```rust
/// use migration_runner::database::{InMemoryDatabase, InMemoryMigrator};
/// use migration_runner::runner::MigrationRunner;
/// use migration_runner::unit::ChangeUnit;
///
/// # fn main() -> migration_runner::errors::RunnerResult<()> {
/// let dir = std::env::temp_dir();
/// let runner = MigrationRunner::builder(InMemoryDatabase::new())
///     .migrations_dir(&dir)
///     .ledger_table("applied_migrations")
///     .extension("sql")
///     .unit(
///         ChangeUnit::<InMemoryMigrator>::builder("001_users.sql")
///             .apply(|m| m.create_table("users", &["id"]))
///             .revert(|m| m.drop_table("users"))
///             .build()?,
///     )
///     .build()?;
/// assert_eq!(runner.config().ledger_schema().table_name(), "applied_migrations");
/// # Ok(())
/// # }
/// ```
pub struct MigrationRunnerBuilder<D: DatabaseProvider> {
    error: Option<RunnerError>,
    config: RunnerConfig,
    database: D,
    registry: UnitRegistry<D::Migrator>,
}

impl<D: DatabaseProvider> MigrationRunnerBuilder<D> {
    pub fn new(database: D) -> Self {
        MigrationRunnerBuilder {
            error: None,
            config: RunnerConfig::new(),
            database,
            registry: UnitRegistry::new(),
        }
    }

    /// Directory holding one file per change-unit.
    pub fn migrations_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config.set_migrations_dir(dir.as_ref());
        self
    }

    /// Name of the ledger table, `schemamigration` by default.
    pub fn ledger_table(mut self, table: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_ledger_table(table) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Name of the ledger's key column, `filename` by default.
    pub fn ledger_column(mut self, column: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_ledger_column(column) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Restricts discovery to files with this extension.
    pub fn extension(mut self, extension: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_extension(extension) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Replaces the unit registry. Units added through [`Self::unit`] before
    /// this call are discarded.
    pub fn registry(mut self, registry: UnitRegistry<D::Migrator>) -> Self {
        self.registry = registry;
        self
    }

    /// Registers one change-unit.
    pub fn unit(mut self, unit: ChangeUnit<D::Migrator>) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.registry.register(unit) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Validates the configuration and prepares the ledger table.
    ///
    /// # Errors
    ///
    /// The first error captured by a setter, a `ConfigError` when the
    /// migrations directory does not exist, or the backend error raised while
    /// creating the ledger table.
    pub fn build(self) -> RunnerResult<MigrationRunner<D>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        MigrationRunner::open(self.database, self.registry, self.config)
    }
}
