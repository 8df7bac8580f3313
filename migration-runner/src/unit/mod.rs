//! Change-units and how they are found.
//!
//! A change-unit is a named pair of operations: `apply` (required) and
//! `revert` (optional). Units are declared in code and registered in a
//! [`UnitRegistry`] under the file name they belong to; the migrations
//! directory decides which of them exist, and the [`UnitLoader`] joins the two.
//!
//! ```rust
//! use migration_runner::database::InMemoryMigrator;
//! use migration_runner::unit::{ChangeUnit, UnitRegistry};
//!
//! let unit = ChangeUnit::<InMemoryMigrator>::builder("001_add_email.sql")
//!     .apply(|m| m.add_column("users", "email"))
//!     .revert(|m| m.drop_column("users", "email"))
//!     .build()
//!     .unwrap();
//!
//! let mut registry = UnitRegistry::new();
//! registry.register(unit).unwrap();
//! assert!(registry.contains("001_add_email.sql"));
//! ```

mod loader;
mod registry;

pub use loader::UnitLoader;
pub use registry::UnitRegistry;

use crate::errors::{ErrorKind, RunnerError, RunnerResult};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Operation slot of a change-unit: receives the migrator handle.
pub type UnitFn<M> = Arc<dyn Fn(&M) -> RunnerResult<()> + Send + Sync + 'static>;

/// A named, immutable pair of schema operations.
pub struct ChangeUnit<M> {
    name: String,
    apply: UnitFn<M>,
    revert: Option<UnitFn<M>>,
}

// manual impl: derive would require `M: Clone`
impl<M> Clone for ChangeUnit<M> {
    fn clone(&self) -> Self {
        ChangeUnit {
            name: self.name.clone(),
            apply: self.apply.clone(),
            revert: self.revert.clone(),
        }
    }
}

impl<M> Debug for ChangeUnit<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeUnit")
            .field("name", &self.name)
            .field("apply", &"<fn>")
            .field("revert", &self.revert.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl<M> ChangeUnit<M> {
    /// Starts building a unit called `name`; the name is the unit's ledger key.
    pub fn builder(name: &str) -> ChangeUnitBuilder<M> {
        ChangeUnitBuilder {
            name: name.to_string(),
            apply: None,
            revert: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_revert(&self) -> bool {
        self.revert.is_some()
    }

    /// Runs the forward operation.
    pub fn apply(&self, migrator: &M) -> RunnerResult<()> {
        (self.apply)(migrator)
    }

    /// Runs the backward operation.
    ///
    /// Fails with [`ErrorKind::NoRevertDefined`] when the unit has none.
    pub fn revert(&self, migrator: &M) -> RunnerResult<()> {
        match &self.revert {
            Some(revert) => revert(migrator),
            None => Err(no_revert_defined(&self.name)),
        }
    }
}

pub(crate) fn no_revert_defined(name: &str) -> RunnerError {
    RunnerError::new(
        &format!("Cannot rollback with {}, revert operation not defined", name),
        ErrorKind::NoRevertDefined(name.to_string()),
    )
}

/// Builder for [`ChangeUnit`]. `build` fails if no apply operation was set.
pub struct ChangeUnitBuilder<M> {
    name: String,
    apply: Option<UnitFn<M>>,
    revert: Option<UnitFn<M>>,
}

impl<M> ChangeUnitBuilder<M> {
    pub fn apply<F>(mut self, f: F) -> Self
    where
        F: Fn(&M) -> RunnerResult<()> + Send + Sync + 'static,
    {
        self.apply = Some(Arc::new(f));
        self
    }

    pub fn revert<F>(mut self, f: F) -> Self
    where
        F: Fn(&M) -> RunnerResult<()> + Send + Sync + 'static,
    {
        self.revert = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> RunnerResult<ChangeUnit<M>> {
        match self.apply {
            Some(apply) => Ok(ChangeUnit {
                name: self.name,
                apply,
                revert: self.revert,
            }),
            None => {
                log::error!("Change-unit {} does not define an apply operation", self.name);
                Err(RunnerError::new(
                    &format!("Change-unit {} does not contain an apply operation", self.name),
                    ErrorKind::MalformedUnit(self.name),
                ))
            }
        }
    }
}
