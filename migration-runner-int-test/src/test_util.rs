use migration_runner::errors::{ErrorKind, RunnerError, RunnerResult};
use migration_runner::{ChangeUnit, DatabaseProvider, MigrationRunner, UnitRegistry};
use migration_runner_sqlite_adapter::{SqliteDatabase, SqliteMigrator};
use std::path::{Path, PathBuf};
use std::{env, fs};

/// Runs `test` between `before` and `after`. `after` always runs, even when
/// the test fails, so temporary files are cleaned up.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: FnOnce(&TestContext) -> RunnerResult<()> + std::panic::UnwindSafe,
    B: FnOnce() -> RunnerResult<TestContext>,
    A: FnOnce(&TestContext) -> RunnerResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let ctx_ref = std::panic::AssertUnwindSafe(&ctx);
    let result = std::panic::catch_unwind(move || test(*ctx_ref));
    let after_result = after(&ctx);

    match result {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic_err) => {
            let msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            panic!("Test execution failed with panic: {}", msg);
        }
    }

    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

/// A scratch directory holding a SQLite file and an empty migrations folder.
pub struct TestContext {
    root: PathBuf,
    db_path: String,
    db: SqliteDatabase,
}

impl TestContext {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    pub fn db(&self) -> SqliteDatabase {
        self.db.clone()
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.root.join("migrations")
    }

    /// Creates an empty unit file in the migrations directory.
    pub fn write_unit(&self, name: &str) -> RunnerResult<()> {
        fs::write(self.migrations_dir().join(name), "")?;
        Ok(())
    }

    pub fn remove_unit(&self, name: &str) -> RunnerResult<()> {
        fs::remove_file(self.migrations_dir().join(name))?;
        Ok(())
    }

    /// Opens a runner over this context's database and migrations directory.
    pub fn runner(
        &self,
        registry: UnitRegistry<SqliteMigrator>,
    ) -> RunnerResult<MigrationRunner<SqliteDatabase>> {
        MigrationRunner::new(self.db(), registry, self.migrations_dir())
    }

    /// Opens a second connection to the same file, as a restarted process would.
    pub fn reopen(&self) -> RunnerResult<SqliteDatabase> {
        SqliteDatabase::open(&self.db_path)
    }

    pub fn columns(&self, table: &str) -> RunnerResult<Vec<String>> {
        self.db.migrator()?.columns(table)
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    let temp_dir = env::temp_dir();
    temp_dir.join(id.to_string()).to_string_lossy().to_string()
}

/// Creates a fresh context whose database holds
/// `mytable (id INTEGER PRIMARY KEY AUTOINCREMENT)`.
pub fn create_test_context() -> RunnerResult<TestContext> {
    let root = PathBuf::from(random_path());
    fs::create_dir_all(root.join("migrations"))?;

    let db_path = root.join("test.db").to_string_lossy().to_string();
    let db = SqliteDatabase::open(&db_path)?;
    db.migrator()?
        .execute_batch("CREATE TABLE mytable (id INTEGER PRIMARY KEY AUTOINCREMENT)")?;

    Ok(TestContext { root, db_path, db })
}

pub fn cleanup(ctx: &TestContext) -> RunnerResult<()> {
    if ctx.root.exists() {
        fs::remove_dir_all(&ctx.root)?;
    }
    Ok(())
}

/// A unit that adds `column` to `mytable` and drops it again on revert.
pub fn add_column_unit(name: &str, column: &str) -> RunnerResult<ChangeUnit<SqliteMigrator>> {
    let add = format!(
        "ALTER TABLE mytable ADD COLUMN {} INTEGER NOT NULL DEFAULT 0",
        column
    );
    let drop = format!("ALTER TABLE mytable DROP COLUMN {}", column);
    ChangeUnit::builder(name)
        .apply(move |m: &SqliteMigrator| m.execute_batch(&add))
        .revert(move |m: &SqliteMigrator| m.execute_batch(&drop))
        .build()
}

/// A unit that adds `column` but cannot be reverted.
pub fn one_way_unit(name: &str, column: &str) -> RunnerResult<ChangeUnit<SqliteMigrator>> {
    let add = format!(
        "ALTER TABLE mytable ADD COLUMN {} INTEGER NOT NULL DEFAULT 0",
        column
    );
    ChangeUnit::builder(name)
        .apply(move |m: &SqliteMigrator| m.execute_batch(&add))
        .build()
}

/// A unit that performs a schema edit and then fails.
pub fn failing_unit(name: &str) -> RunnerResult<ChangeUnit<SqliteMigrator>> {
    let unit = name.to_string();
    ChangeUnit::builder(name)
        .apply(move |m: &SqliteMigrator| {
            m.execute_batch("CREATE TABLE half_done (id INTEGER)")?;
            Err(RunnerError::new(
                &format!("{} gave up halfway", unit),
                ErrorKind::InternalError,
            ))
        })
        .build()
}

pub fn registry_of(
    units: Vec<RunnerResult<ChangeUnit<SqliteMigrator>>>,
) -> RunnerResult<UnitRegistry<SqliteMigrator>> {
    let mut registry = UnitRegistry::new();
    for unit in units {
        registry.register(unit?)?;
    }
    Ok(registry)
}
