//! # migration_runner
//!
//! Applies and reverses ordered schema changes against a relational database,
//! keeping a ledger table of what has been applied so that running again is a
//! no-op and the last change can be rolled back.
//!
//! ## Model
//!
//! - A **change-unit** is a named pair of operations, `apply` and an optional
//!   `revert`, registered in a [`unit::UnitRegistry`].
//! - The **migrations directory** holds one file per unit. The file name is the
//!   unit's identity and sort key; files starting with `_` are ignored.
//! - The **ledger** is a one-column table (`schemamigration(filename)` by
//!   default) listing applied units.
//!
//! `run` applies the pending units in name order, each inside its own
//! transaction together with its ledger insert. `rollback` reverts the applied
//! unit with the greatest name, again in one transaction with the ledger delete.
//!
//! ## Module Organization
//!
//! - [`database`] - collaborator trait for database drivers, in-memory driver
//! - [`errors`] - error types and result alias
//! - [`ledger`] - the applied-set table
//! - [`scheduler`] - execution order and rollback target
//! - [`coordinator`] - transactional apply/revert of a single unit
//! - [`unit`] - change-units, registry and directory loader
//! - [`runner`] - the `run`/`rollback` façade
//! - [`runner_builder`], [`runner_config`] - runner configuration

pub mod common;
pub mod coordinator;
pub mod database;
pub mod errors;
pub mod ledger;
pub mod runner;
pub mod runner_builder;
pub mod runner_config;
pub mod scheduler;
mod transaction;
pub mod unit;

pub use database::{DatabaseProvider, LedgerSchema};
pub use errors::{ErrorKind, RunnerError, RunnerResult};
pub use runner::{MigrationRunner, MigrationStatus};
pub use unit::{ChangeUnit, UnitRegistry};
