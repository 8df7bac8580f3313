use crate::database::DatabaseProvider;
use crate::errors::RunnerResult;

/// An open database transaction scoped to one change-unit.
///
/// Consumed by [`Transaction::commit`] or [`Transaction::rollback`]. A
/// transaction that is dropped while still open (early return, panic inside
/// a unit operation) is rolled back.
pub(crate) struct Transaction<'a, D: DatabaseProvider> {
    database: &'a D,
    open: bool,
}

impl<'a, D: DatabaseProvider> Transaction<'a, D> {
    pub(crate) fn begin(database: &'a D) -> RunnerResult<Self> {
        database.begin_transaction()?;
        log::trace!("Transaction opened");
        Ok(Transaction { database, open: true })
    }

    /// Commits. If the commit itself fails the transaction stays open and is
    /// rolled back on drop.
    pub(crate) fn commit(mut self) -> RunnerResult<()> {
        self.database.commit()?;
        self.open = false;
        log::trace!("Transaction committed");
        Ok(())
    }

    pub(crate) fn rollback(mut self) -> RunnerResult<()> {
        self.open = false;
        self.database.rollback()?;
        log::trace!("Transaction rolled back");
        Ok(())
    }
}

impl<D: DatabaseProvider> Drop for Transaction<'_, D> {
    fn drop(&mut self) {
        if self.open {
            self.open = false;
            if let Err(err) = self.database.rollback() {
                log::error!("Failed to roll back abandoned transaction: {}", err);
            }
        }
    }
}
