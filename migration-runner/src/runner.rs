use crate::coordinator::TransactionCoordinator;
use crate::database::DatabaseProvider;
use crate::errors::RunnerResult;
use crate::ledger::Ledger;
use crate::runner_builder::MigrationRunnerBuilder;
use crate::runner_config::RunnerConfig;
use crate::scheduler;
use crate::unit::{UnitLoader, UnitRegistry};
use std::path::Path;
use std::sync::Arc;

/// Applied and pending units at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MigrationStatus {
    /// Ledger records, ascending.
    pub applied: Vec<String>,
    /// Discovered units not yet applied, in execution order.
    pub pending: Vec<String>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Applies and rolls back change-units found in a migrations directory.
///
/// `run` applies every pending unit in name order, each in its own
/// transaction, and stops at the first failure. Units committed before the
/// failure stay applied, so `run` can simply be called again once the
/// failing unit is fixed. `rollback` reverts exactly one unit: the applied
/// unit with the greatest name.
///
/// # Concurrency
///
/// Calls are synchronous and units run strictly one after another. Nothing
/// guards against two processes migrating the same database at once: the
/// pending list is computed before the per-unit transactions run. Callers
/// that may race must hold an external lock (an advisory lock in the
/// database, a lock file) around the whole `run` or `rollback` call.
///
/// # Examples
///
/// ```rust
/// use migration_runner::database::{InMemoryDatabase, InMemoryMigrator};
/// use migration_runner::runner::MigrationRunner;
/// use migration_runner::unit::{ChangeUnit, UnitRegistry};
///
/// # fn main() -> migration_runner::errors::RunnerResult<()> {
/// let dir = std::env::temp_dir().join(format!("doc-{}", std::process::id()));
/// std::fs::create_dir_all(&dir)?;
/// std::fs::write(dir.join("001_users.sql"), "")?;
///
/// let mut registry = UnitRegistry::new();
/// registry.register(
///     ChangeUnit::<InMemoryMigrator>::builder("001_users.sql")
///         .apply(|m| m.create_table("users", &["id"]))
///         .revert(|m| m.drop_table("users"))
///         .build()?,
/// )?;
///
/// let db = InMemoryDatabase::new();
/// let runner = MigrationRunner::new(db.clone(), registry, &dir)?;
/// assert_eq!(runner.run()?, vec!["001_users.sql".to_string()]);
/// assert!(db.has_table("users"));
///
/// assert_eq!(runner.rollback()?, Some("001_users.sql".to_string()));
/// assert!(!db.has_table("users"));
/// # std::fs::remove_dir_all(&dir)?;
/// # Ok(())
/// # }
/// ```
pub struct MigrationRunner<D: DatabaseProvider> {
    inner: Arc<MigrationRunnerInner<D>>,
}

impl<D: DatabaseProvider> Clone for MigrationRunner<D> {
    fn clone(&self) -> Self {
        MigrationRunner {
            inner: self.inner.clone(),
        }
    }
}

impl<D: DatabaseProvider> MigrationRunner<D> {
    /// Creates a runner with the default ledger table.
    ///
    /// # Errors
    ///
    /// `ConfigError` if `migrations_dir` does not exist; otherwise the
    /// ledger table is created if absent.
    pub fn new<P: AsRef<Path>>(
        database: D,
        registry: UnitRegistry<D::Migrator>,
        migrations_dir: P,
    ) -> RunnerResult<Self> {
        MigrationRunnerBuilder::new(database)
            .registry(registry)
            .migrations_dir(migrations_dir)
            .build()
    }

    pub fn builder(database: D) -> MigrationRunnerBuilder<D> {
        MigrationRunnerBuilder::new(database)
    }

    pub(crate) fn open(
        database: D,
        registry: UnitRegistry<D::Migrator>,
        config: RunnerConfig,
    ) -> RunnerResult<Self> {
        config.validate()?;

        let database = Arc::new(database);
        let ledger = Ledger::new(database.clone(), config.ledger_schema().clone());
        ledger.ensure_table()?;

        let loader = UnitLoader::new(
            config.migrations_dir(),
            Arc::new(registry),
            config.extension().map(str::to_string),
        );
        let coordinator = TransactionCoordinator::new(database, ledger.clone());

        log::debug!(
            "Migration runner ready for {}",
            config.migrations_dir().display()
        );
        Ok(MigrationRunner {
            inner: Arc::new(MigrationRunnerInner {
                config,
                loader,
                ledger,
                coordinator,
            }),
        })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.inner.config
    }

    /// Applies all pending units in order and returns the names applied.
    ///
    /// Stops at the first unit that fails to load or apply; that error is
    /// returned and later units are not attempted.
    pub fn run(&self) -> RunnerResult<Vec<String>> {
        self.inner.run()
    }

    /// Reverts the last applied unit and returns its name, or `None` when the
    /// ledger is empty.
    pub fn rollback(&self) -> RunnerResult<Option<String>> {
        self.inner.rollback()
    }

    /// Units that `run` would apply, in order.
    pub fn pending(&self) -> RunnerResult<Vec<String>> {
        self.inner.pending()
    }

    /// Ledger records, ascending.
    pub fn applied(&self) -> RunnerResult<Vec<String>> {
        Ok(self.inner.ledger.applied()?.into_iter().collect())
    }

    pub fn status(&self) -> RunnerResult<MigrationStatus> {
        let applied = self.inner.ledger.applied()?;
        let pending = scheduler::pending(self.inner.loader.discover()?, &applied);
        Ok(MigrationStatus {
            applied: applied.into_iter().collect(),
            pending,
        })
    }
}

struct MigrationRunnerInner<D: DatabaseProvider> {
    config: RunnerConfig,
    loader: UnitLoader<D::Migrator>,
    ledger: Ledger<D>,
    coordinator: TransactionCoordinator<D>,
}

impl<D: DatabaseProvider> MigrationRunnerInner<D> {
    fn pending(&self) -> RunnerResult<Vec<String>> {
        let applied = self.ledger.applied()?;
        Ok(scheduler::pending(self.loader.discover()?, &applied))
    }

    fn run(&self) -> RunnerResult<Vec<String>> {
        let pending = self.pending()?;
        if pending.is_empty() {
            log::info!("No pending migrations");
            return Ok(Vec::new());
        }

        log::info!("Running {} pending migrations", pending.len());
        let mut applied = Vec::with_capacity(pending.len());
        for name in pending {
            let unit = self.loader.load_named(&name)?;
            self.coordinator.apply_unit(&unit)?;
            applied.push(name);
        }

        log::info!("Applied {} migrations", applied.len());
        Ok(applied)
    }

    fn rollback(&self) -> RunnerResult<Option<String>> {
        let applied = self.ledger.applied()?;
        let last = match scheduler::last_applied(&applied) {
            Some(last) => last,
            None => {
                log::info!("No migrations to roll back");
                return Ok(None);
            }
        };

        let unit = self.loader.load_named(&last)?;
        self.coordinator.revert_unit(&unit, &last)?;
        log::info!("Rolled back {}", last);
        Ok(Some(last))
    }
}
