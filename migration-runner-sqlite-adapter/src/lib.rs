//! SQLite database driver for `migration_runner`, built on `rusqlite`.

mod config;
mod database;
mod migrator;
mod wrapper;

pub use config::*;
pub use database::*;
pub use migrator::*;
pub use wrapper::SqliteConfigError;
