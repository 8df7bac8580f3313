//! Transactional apply and revert of single change-units.
//!
//! The unit's operation and the ledger mutation share one transaction, so the
//! ledger always matches the schema: either both changes commit or neither
//! does. There is no transaction spanning several units.

use crate::database::DatabaseProvider;
use crate::errors::{ErrorKind, RunnerError, RunnerResult};
use crate::ledger::Ledger;
use crate::transaction::Transaction;
use crate::unit::{no_revert_defined, ChangeUnit};
use std::sync::Arc;

pub struct TransactionCoordinator<D: DatabaseProvider> {
    database: Arc<D>,
    ledger: Ledger<D>,
}

impl<D: DatabaseProvider> TransactionCoordinator<D> {
    pub fn new(database: Arc<D>, ledger: Ledger<D>) -> Self {
        TransactionCoordinator { database, ledger }
    }

    /// Applies `unit` and records it in the ledger, atomically.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::ApplyFailed`] wrapping the cause when the transaction,
    /// the apply operation or the ledger insert fails. Nothing is left behind.
    pub fn apply_unit(&self, unit: &ChangeUnit<D::Migrator>) -> RunnerResult<()> {
        log::info!("Applying {}", unit.name());
        self.in_transaction(|migrator| {
            unit.apply(migrator)?;
            self.ledger.insert(unit.name())
        })
        .map_err(|cause| {
            log::error!("Failed to apply {}: {}", unit.name(), cause);
            RunnerError::new_with_cause(
                &format!("Failed to apply {}", unit.name()),
                ErrorKind::ApplyFailed(unit.name().to_string()),
                cause,
            )
        })
    }

    /// Reverts `unit` and deletes its ledger `record`, atomically.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoRevertDefined`] before any transaction is opened when
    /// the unit has no revert operation. [`ErrorKind::RevertFailed`] wrapping
    /// the cause when the revert or the ledger delete fails; the record then
    /// stays in the ledger.
    pub fn revert_unit(&self, unit: &ChangeUnit<D::Migrator>, record: &str) -> RunnerResult<()> {
        if !unit.has_revert() {
            log::error!("Cannot roll back {}: no revert operation", unit.name());
            return Err(no_revert_defined(unit.name()));
        }

        log::info!("Reverting {}", unit.name());
        self.in_transaction(|migrator| {
            unit.revert(migrator)?;
            if !self.ledger.remove(record)? {
                return Err(RunnerError::new(
                    &format!("Ledger record {} does not exist", record),
                    ErrorKind::InternalError,
                ));
            }
            Ok(())
        })
        .map_err(|cause| {
            log::error!("Failed to revert {}: {}", unit.name(), cause);
            RunnerError::new_with_cause(
                &format!("Failed to revert {}", unit.name()),
                ErrorKind::RevertFailed(unit.name().to_string()),
                cause,
            )
        })
    }

    fn in_transaction<F>(&self, work: F) -> RunnerResult<()>
    where
        F: FnOnce(&D::Migrator) -> RunnerResult<()>,
    {
        let transaction = Transaction::begin(self.database.as_ref())?;
        let migrator = self.database.migrator()?;

        match work(&migrator) {
            Ok(()) => transaction.commit(),
            Err(err) => {
                if let Err(rollback_err) = transaction.rollback() {
                    log::error!("Rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }
}
