use super::ChangeUnit;
use crate::errors::{ErrorKind, RunnerError, RunnerResult};
use std::collections::BTreeMap;

/// Typed registry of change-units, keyed by unit name.
///
/// Populated by explicit registration at start-up. The registry says *how*
/// a unit changes the schema; whether the unit exists at all is decided by
/// its file in the migrations directory.
pub struct UnitRegistry<M> {
    units: BTreeMap<String, ChangeUnit<M>>,
}

impl<M> Default for UnitRegistry<M> {
    fn default() -> Self {
        UnitRegistry::new()
    }
}

impl<M> Clone for UnitRegistry<M> {
    fn clone(&self) -> Self {
        UnitRegistry {
            units: self.units.clone(),
        }
    }
}

impl<M> UnitRegistry<M> {
    pub fn new() -> Self {
        UnitRegistry {
            units: BTreeMap::new(),
        }
    }

    /// Registers a unit. Two units may not share a name.
    pub fn register(&mut self, unit: ChangeUnit<M>) -> RunnerResult<()> {
        if self.units.contains_key(unit.name()) {
            log::error!("Change-unit {} is registered twice", unit.name());
            return Err(RunnerError::new(
                &format!("Change-unit {} is already registered", unit.name()),
                ErrorKind::ConfigError,
            ));
        }
        log::debug!("Registered change-unit {}", unit.name());
        self.units.insert(unit.name().to_string(), unit);
        Ok(())
    }

    /// Builds and registers a unit in one go.
    pub fn add<A, R>(&mut self, name: &str, apply: A, revert: Option<R>) -> RunnerResult<()>
    where
        A: Fn(&M) -> RunnerResult<()> + Send + Sync + 'static,
        R: Fn(&M) -> RunnerResult<()> + Send + Sync + 'static,
    {
        let mut builder = ChangeUnit::builder(name).apply(apply);
        if let Some(revert) = revert {
            builder = builder.revert(revert);
        }
        self.register(builder.build()?)
    }

    pub fn get(&self, name: &str) -> Option<&ChangeUnit<M>> {
        self.units.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Registered names in ascending order.
    pub fn names(&self) -> Vec<String> {
        self.units.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
