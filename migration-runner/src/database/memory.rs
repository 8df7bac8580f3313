use super::{DatabaseProvider, LedgerSchema};
use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use crate::errors::{ErrorKind, RunnerError, RunnerResult};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct DatabaseState {
    /// table name -> ordered column names
    tables: BTreeMap<String, Vec<String>>,
    /// ledger table name -> record names
    ledgers: BTreeMap<String, BTreeSet<String>>,
}

/// In-memory implementation of [`DatabaseProvider`].
///
/// # Purpose
/// Models a relational catalog (tables and their columns) plus ledger rows,
/// enough to exercise the runner without a database driver. Useful in tests
/// and for dry runs of a registry.
///
/// # Transactions
/// `begin_transaction` snapshots the whole state; `rollback` restores the
/// snapshot and `commit` drops it. Nested transactions are rejected.
///
/// # Usage
/// ```rust
/// use migration_runner::database::{DatabaseProvider, InMemoryDatabase};
///
/// let db = InMemoryDatabase::new();
/// let migrator = db.migrator().unwrap();
/// migrator.create_table("users", &["id"]).unwrap();
///
/// db.begin_transaction().unwrap();
/// migrator.add_column("users", "email").unwrap();
/// db.rollback().unwrap();
///
/// assert_eq!(db.columns("users"), Some(vec!["id".to_string()]));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    inner: Arc<InMemoryDatabaseInner>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        InMemoryDatabase {
            inner: Arc::new(InMemoryDatabaseInner::new()),
        }
    }

    /// Returns the columns of `table`, or `None` if the table does not exist.
    pub fn columns(&self, table: &str) -> Option<Vec<String>> {
        self.inner.state.read_with(|state| state.tables.get(table).cloned())
    }

    /// Returns whether `table` exists.
    pub fn has_table(&self, table: &str) -> bool {
        self.inner.state.read_with(|state| state.tables.contains_key(table))
    }

    /// Returns whether a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.inner.snapshot.lock().is_some()
    }
}

impl DatabaseProvider for InMemoryDatabase {
    type Migrator = InMemoryMigrator;

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
        self.inner.create_table_if_absent(schema);
        Ok(())
    }

    fn migrator(&self) -> RunnerResult<InMemoryMigrator> {
        Ok(InMemoryMigrator {
            state: self.inner.state.clone(),
        })
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

#[derive(Default)]
struct InMemoryDatabaseInner {
    state: Atomic<DatabaseState>,
    snapshot: Mutex<Option<DatabaseState>>,
}

impl InMemoryDatabaseInner {
    fn new() -> Self {
        InMemoryDatabaseInner {
            state: atomic(DatabaseState::default()),
            snapshot: Mutex::new(None),
        }
    }

    fn begin_transaction(&self) -> RunnerResult<()> {
        let mut snapshot = self.snapshot.lock();
        if snapshot.is_some() {
            log::error!("Cannot begin a transaction while another one is open");
            return Err(RunnerError::new(
                "A transaction is already open",
                ErrorKind::BackendError,
            ));
        }
        *snapshot = Some(self.state.read_with(|state| state.clone()));
        Ok(())
    }

    fn commit(&self) -> RunnerResult<()> {
        match self.snapshot.lock().take() {
            Some(_) => Ok(()),
            None => Err(RunnerError::new(
                "No open transaction to commit",
                ErrorKind::BackendError,
            )),
        }
    }

    fn rollback(&self) -> RunnerResult<()> {
        match self.snapshot.lock().take() {
            Some(saved) => {
                self.state.write_with(|state| *state = saved);
                Ok(())
            }
            None => Err(RunnerError::new(
                "No open transaction to roll back",
                ErrorKind::BackendError,
            )),
        }
    }

    fn create_table_if_absent(&self, schema: &LedgerSchema) {
        self.state.write_with(|state| {
            state
                .tables
                .entry(schema.table_name().to_string())
                .or_insert_with(|| vec![schema.column_name().to_string()]);
            state
                .ledgers
                .entry(schema.table_name().to_string())
                .or_default();
        });
    }

    fn insert_record(&self, schema: &LedgerSchema, name: &str) -> RunnerResult<()> {
        self.state.write_with(|state| {
            let ledger = ledger_mut(state, schema)?;
            if !ledger.insert(name.to_string()) {
                return Err(RunnerError::new(
                    &format!(
                        "UNIQUE constraint failed: {}.{} ({})",
                        schema.table_name(),
                        schema.column_name(),
                        name
                    ),
                    ErrorKind::BackendError,
                ));
            }
            Ok(())
        })
    }

    fn delete_record(&self, schema: &LedgerSchema, name: &str) -> RunnerResult<bool> {
        self.state
            .write_with(|state| Ok(ledger_mut(state, schema)?.remove(name)))
    }

    fn record_names(&self, schema: &LedgerSchema) -> RunnerResult<Vec<String>> {
        self.state.read_with(|state| match state.ledgers.get(schema.table_name()) {
            Some(ledger) => Ok(ledger.iter().cloned().collect()),
            None => Err(no_such_table(schema.table_name())),
        })
    }
}

fn ledger_mut<'a>(
    state: &'a mut DatabaseState,
    schema: &LedgerSchema,
) -> RunnerResult<&'a mut BTreeSet<String>> {
    state
        .ledgers
        .get_mut(schema.table_name())
        .ok_or_else(|| no_such_table(schema.table_name()))
}

fn no_such_table(table: &str) -> RunnerError {
    RunnerError::new(&format!("no such table: {}", table), ErrorKind::BackendError)
}

/// Migrator handle of [`InMemoryDatabase`].
///
/// Edits go straight to the shared state; the surrounding transaction decides
/// whether they survive.
#[derive(Clone)]
pub struct InMemoryMigrator {
    state: Atomic<DatabaseState>,
}

impl InMemoryMigrator {
    pub fn create_table(&self, table: &str, columns: &[&str]) -> RunnerResult<()> {
        self.state.write_with(|state| {
            if state.tables.contains_key(table) {
                return Err(RunnerError::new(
                    &format!("table {} already exists", table),
                    ErrorKind::BackendError,
                ));
            }
            state.tables.insert(
                table.to_string(),
                columns.iter().map(|c| c.to_string()).collect(),
            );
            Ok(())
        })
    }

    pub fn drop_table(&self, table: &str) -> RunnerResult<()> {
        self.state.write_with(|state| match state.tables.remove(table) {
            Some(_) => Ok(()),
            None => Err(no_such_table(table)),
        })
    }

    pub fn add_column(&self, table: &str, column: &str) -> RunnerResult<()> {
        self.state.write_with(|state| {
            let columns = state
                .tables
                .get_mut(table)
                .ok_or_else(|| no_such_table(table))?;
            if columns.iter().any(|c| c == column) {
                return Err(RunnerError::new(
                    &format!("duplicate column name: {}", column),
                    ErrorKind::BackendError,
                ));
            }
            columns.push(column.to_string());
            Ok(())
        })
    }

    pub fn drop_column(&self, table: &str, column: &str) -> RunnerResult<()> {
        self.state.write_with(|state| {
            let columns = state
                .tables
                .get_mut(table)
                .ok_or_else(|| no_such_table(table))?;
            let before = columns.len();
            columns.retain(|c| c != column);
            if columns.len() == before {
                return Err(RunnerError::new(
                    &format!("no such column: \"{}\"", column),
                    ErrorKind::BackendError,
                ));
            }
            Ok(())
        })
    }

    pub fn columns(&self, table: &str) -> RunnerResult<Vec<String>> {
        self.state.read_with(|state| {
            state
                .tables
                .get(table)
                .cloned()
                .ok_or_else(|| no_such_table(table))
        })
    }
}
