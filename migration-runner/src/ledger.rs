//! The applied-set ledger.
//!
//! One table, one primary-key column holding unit names. A record exists
//! exactly while the unit's apply is committed and not yet reverted.

use crate::database::{DatabaseProvider, LedgerSchema};
use crate::errors::RunnerResult;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Read and write access to the ledger table.
pub struct Ledger<D: DatabaseProvider> {
    database: Arc<D>,
    schema: LedgerSchema,
}

impl<D: DatabaseProvider> Clone for Ledger<D> {
    fn clone(&self) -> Self {
        Ledger {
            database: self.database.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl<D: DatabaseProvider> Ledger<D> {
    pub fn new(database: Arc<D>, schema: LedgerSchema) -> Self {
        Ledger { database, schema }
    }

    pub fn schema(&self) -> &LedgerSchema {
        &self.schema
    }

    /// Creates the ledger table if it is missing. Safe to call on every start.
    pub fn ensure_table(&self) -> RunnerResult<()> {
        log::debug!("Ensuring ledger table {} exists", self.schema.table_name());
        self.database.create_table_if_absent(&self.schema)
    }

    /// Applied unit names, ordered by name.
    pub fn applied(&self) -> RunnerResult<BTreeSet<String>> {
        Ok(self
            .database
            .record_names(&self.schema)?
            .into_iter()
            .collect())
    }

    pub fn contains(&self, name: &str) -> RunnerResult<bool> {
        Ok(self.applied()?.contains(name))
    }

    pub(crate) fn insert(&self, name: &str) -> RunnerResult<()> {
        self.database.insert_record(&self.schema, name)
    }

    pub(crate) fn remove(&self, name: &str) -> RunnerResult<bool> {
        self.database.delete_record(&self.schema, name)
    }
}
