//! Database collaborator interface.
//!
//! The runner never talks to a database driver directly. Everything it needs
//! (transactions, the ledger table, a migrator handle for change-units) goes
//! through [`DatabaseProvider`]. Two providers exist: [`InMemoryDatabase`] in
//! this crate and the SQLite adapter in `migration_runner_sqlite_adapter`.

mod memory;

pub use memory::{InMemoryDatabase, InMemoryMigrator};

use crate::common::{LEDGER_COLUMN, LEDGER_TABLE};
use crate::errors::RunnerResult;

/// Shape of the ledger table: a single text column that is the primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSchema {
    table_name: String,
    column_name: String,
}

impl LedgerSchema {
    pub fn new(table_name: &str, column_name: &str) -> Self {
        LedgerSchema {
            table_name: table_name.to_string(),
            column_name: column_name.to_string(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }
}

impl Default for LedgerSchema {
    fn default() -> Self {
        LedgerSchema::new(LEDGER_TABLE, LEDGER_COLUMN)
    }
}

/// Services the runner consumes from a concrete database driver.
///
/// # Transactions
/// `begin_transaction`, `commit` and `rollback` bracket exactly one change-unit.
/// Ledger mutations issued between `begin_transaction` and `commit` must become
/// visible atomically with the schema edits performed through the migrator, and
/// must disappear with them on `rollback`.
///
/// # Migrator
/// [`DatabaseProvider::migrator`] hands out the opaque capability passed to
/// change-unit operations. It must act on the same connection (and therefore the
/// same open transaction) as the provider itself.
pub trait DatabaseProvider: Send + Sync {
    /// Handle given to apply/revert operations.
    type Migrator;

    /// Opens a transaction on the live connection.
    fn begin_transaction(&self) -> RunnerResult<()>;

    /// Commits the open transaction.
    fn commit(&self) -> RunnerResult<()>;

    /// Discards everything done since `begin_transaction`.
    fn rollback(&self) -> RunnerResult<()>;

    /// Creates the ledger table unless it already exists. Must be idempotent.
    fn create_table_if_absent(&self, schema: &LedgerSchema) -> RunnerResult<()>;

    /// Returns a migrator handle bound to the live connection.
    fn migrator(&self) -> RunnerResult<Self::Migrator>;

    /// Inserts one ledger record. A duplicate name is an error.
    fn insert_record(&self, schema: &LedgerSchema, name: &str) -> RunnerResult<()>;

    /// Deletes one ledger record, returning whether a row was removed.
    fn delete_record(&self, schema: &LedgerSchema, name: &str) -> RunnerResult<bool>;

    /// Returns every name in the ledger, in no particular order.
    fn record_names(&self, schema: &LedgerSchema) -> RunnerResult<Vec<String>>;
}
