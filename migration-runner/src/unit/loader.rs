use super::{ChangeUnit, UnitRegistry};
use crate::common::IGNORED_UNIT_PREFIX;
use crate::errors::{ErrorKind, RunnerError, RunnerResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolves change-units from the migrations directory.
///
/// Discovery lists the unit files in the directory; loading maps one file to
/// its registered [`ChangeUnit`]. File contents are never read.
pub struct UnitLoader<M> {
    directory: PathBuf,
    registry: Arc<UnitRegistry<M>>,
    extension: Option<String>,
}

impl<M> UnitLoader<M> {
    pub fn new(directory: &Path, registry: Arc<UnitRegistry<M>>, extension: Option<String>) -> Self {
        UnitLoader {
            directory: directory.to_path_buf(),
            registry,
            extension,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file that defines unit `name`.
    pub fn location(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    /// Lists the unit names present in the directory, sorted.
    ///
    /// Entries starting with `_`, sub-directories, names that are not valid
    /// UTF-8 and (when an extension filter is set) files with another
    /// extension are skipped.
    pub fn discover(&self) -> RunnerResult<Vec<String>> {
        let entries = fs::read_dir(&self.directory).map_err(|err| {
            log::error!("Failed to list {}: {}", self.directory.display(), err);
            RunnerError::new_with_cause(
                &format!("Failed to list migrations directory {}", self.directory.display()),
                ErrorKind::IOError,
                err.into(),
            )
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            // follows symlinks, same as `load`
            if !entry.path().is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let name = match file_name.to_str() {
                Some(name) => name,
                None => {
                    log::warn!("Skipping non UTF-8 file name {:?}", file_name);
                    continue;
                }
            };

            if name.starts_with(IGNORED_UNIT_PREFIX) {
                log::debug!("Ignoring {}", name);
                continue;
            }

            if !self.matches_extension(name) {
                continue;
            }

            names.push(name.to_string());
        }

        names.sort();
        Ok(names)
    }

    /// Loads the unit defined at `location`.
    ///
    /// The unit's name is the final path segment, used verbatim as ledger key.
    pub fn load(&self, location: &Path) -> RunnerResult<ChangeUnit<M>> {
        let name = location
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                RunnerError::new(
                    &format!("Invalid change-unit location {}", location.display()),
                    ErrorKind::InternalError,
                )
            })?;

        if !location.is_file() {
            log::error!("Change-unit file {} does not exist", location.display());
            return Err(RunnerError::new(
                &format!(
                    "Change-unit file {} does not exist (looking in {})",
                    name,
                    self.directory.display()
                ),
                ErrorKind::MissingUnitFile(name.to_string()),
            ));
        }

        match self.registry.get(name) {
            Some(unit) => Ok(unit.clone()),
            None => {
                log::error!("No apply operation is registered for {}", name);
                Err(RunnerError::new(
                    &format!("Change-unit {} does not contain an apply operation", name),
                    ErrorKind::MalformedUnit(name.to_string()),
                ))
            }
        }
    }

    /// Loads unit `name` from the migrations directory.
    pub fn load_named(&self, name: &str) -> RunnerResult<ChangeUnit<M>> {
        self.load(&self.location(name))
    }

    fn matches_extension(&self, name: &str) -> bool {
        match &self.extension {
            Some(extension) => Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == extension),
            None => true,
        }
    }
}
