//! Configuration of a [`MigrationRunner`](crate::runner::MigrationRunner).

use crate::common::DEFAULT_MIGRATIONS_DIR;
use crate::database::LedgerSchema;
use crate::errors::{ErrorKind, RunnerError, RunnerResult};
use std::env;
use std::path::{Path, PathBuf};

/// Settings shared by every part of a runner.
///
/// Defaults: `<cwd>/migrations`, ledger table `schemamigration(filename)`,
/// every file name accepted regardless of extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    migrations_dir: PathBuf,
    ledger_schema: LedgerSchema,
    extension: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        let migrations_dir = env::current_dir()
            .map(|cwd| cwd.join(DEFAULT_MIGRATIONS_DIR))
            .unwrap_or_else(|err| {
                log::warn!("Cannot read working directory: {}. Using a relative path.", err);
                PathBuf::from(DEFAULT_MIGRATIONS_DIR)
            });

        RunnerConfig {
            migrations_dir,
            ledger_schema: LedgerSchema::default(),
            extension: None,
        }
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    pub fn ledger_schema(&self) -> &LedgerSchema {
        &self.ledger_schema
    }

    /// Only files with this extension count as change-units, when set.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub(crate) fn set_migrations_dir(&mut self, dir: &Path) {
        self.migrations_dir = dir.to_path_buf();
    }

    pub(crate) fn set_ledger_table(&mut self, table: &str) -> RunnerResult<()> {
        validate_identifier(table, "Ledger table name")?;
        self.ledger_schema = LedgerSchema::new(table, self.ledger_schema.column_name());
        Ok(())
    }

    pub(crate) fn set_ledger_column(&mut self, column: &str) -> RunnerResult<()> {
        validate_identifier(column, "Ledger column name")?;
        self.ledger_schema = LedgerSchema::new(self.ledger_schema.table_name(), column);
        Ok(())
    }

    pub(crate) fn set_extension(&mut self, extension: &str) -> RunnerResult<()> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            log::error!("Change-unit extension cannot be empty");
            return Err(RunnerError::new(
                "Change-unit extension cannot be empty",
                ErrorKind::ConfigError,
            ));
        }
        self.extension = Some(extension.to_string());
        Ok(())
    }

    /// Checks that the migrations directory exists.
    pub fn validate(&self) -> RunnerResult<()> {
        if !self.migrations_dir.is_dir() {
            log::error!(
                "Migrations directory {} does not exist",
                self.migrations_dir.display()
            );
            return Err(RunnerError::new(
                &format!(
                    "Migrations directory \"{}\" does not exist.",
                    self.migrations_dir.display()
                ),
                ErrorKind::ConfigError,
            ));
        }
        Ok(())
    }
}

// Ledger identifiers end up inside SQL text, so only plain identifiers are allowed.
fn validate_identifier(value: &str, what: &str) -> RunnerResult<()> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        log::error!("{} {:?} is not a valid identifier", what, value);
        return Err(RunnerError::new(
            &format!("{} \"{}\" is not a valid identifier", what, value),
            ErrorKind::ConfigError,
        ));
    }
    Ok(())
}
