use crate::wrapper::SqliteConfigError;
use std::path::Path;
use std::time::Duration;

/// Default time to wait on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for [`SqliteDatabase`](crate::SqliteDatabase).
///
/// Without a path the database lives in memory and disappears with the
/// connection.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteConfig {
    db_path: Option<String>,
    busy_timeout: Duration,
    foreign_keys: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        SqliteConfig::new()
    }
}

impl SqliteConfig {
    pub fn new() -> SqliteConfig {
        SqliteConfig {
            db_path: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            foreign_keys: true,
        }
    }

    pub fn db_path(&self) -> Option<&str> {
        self.db_path.as_deref()
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path.is_none()
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    pub fn foreign_keys(&self) -> bool {
        self.foreign_keys
    }

    pub(crate) fn set_db_path(&mut self, db_path: &str) {
        self.db_path = Some(db_path.to_string());
    }

    pub(crate) fn set_busy_timeout(&mut self, timeout: Duration) {
        self.busy_timeout = timeout;
    }

    pub(crate) fn set_foreign_keys(&mut self, enabled: bool) {
        self.foreign_keys = enabled;
    }

    pub(crate) fn validate(&self) -> Result<(), SqliteConfigError> {
        if let Some(path) = &self.db_path {
            if path.is_empty() {
                return Err(SqliteConfigError::EmptyPath);
            }
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !parent.is_dir() {
                    return Err(SqliteConfigError::MissingParent(path.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SqliteConfig::new();
        assert!(config.is_in_memory());
        assert_eq!(config.busy_timeout(), DEFAULT_BUSY_TIMEOUT);
        assert!(config.foreign_keys());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_path_is_invalid() {
        let mut config = SqliteConfig::new();
        config.set_db_path("");
        assert_eq!(config.validate(), Err(SqliteConfigError::EmptyPath));
    }

    #[test]
    fn test_missing_parent_is_invalid() {
        let mut config = SqliteConfig::new();
        let path = std::env::temp_dir()
            .join(uuid::Uuid::new_v4().to_string())
            .join("test.db");
        config.set_db_path(path.to_str().unwrap());
        assert!(matches!(
            config.validate(),
            Err(SqliteConfigError::MissingParent(_))
        ));
    }

    #[test]
    fn test_relative_path_is_valid() {
        let mut config = SqliteConfig::new();
        config.set_db_path("test.db");
        assert!(config.validate().is_ok());
        assert_eq!(config.db_path(), Some("test.db"));
    }
}
