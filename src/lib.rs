pub mod commands;
pub mod constants;
pub mod db;
pub mod error;
pub mod limits;
pub mod models;
pub mod native_host;
pub mod streak;
#[cfg(test)]
mod test_utils;
pub mod tracker;
pub mod validation;

use crate::db::{migrations, Database};
use crate::error::InitError;
use directories::ProjectDirs;
use log::info;
use std::path::{Path, PathBuf};

/// Environment variable that points the host at a specific database file.
pub const DB_PATH_ENV: &str = "HABITKEEP_DB_PATH";

/// Database location: `HABITKEEP_DB_PATH` when set, otherwise
/// `habitkeep.db` in the platform data directory (created if missing).
pub fn default_db_path() -> Result<PathBuf, InitError> {
    if let Some(path) = std::env::var_os(DB_PATH_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs =
        ProjectDirs::from("com", "habitkeep", "Habitkeep").ok_or(InitError::NoProjectDirs)?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir).map_err(InitError::DataDirCreation)?;
    Ok(data_dir.join("habitkeep.db"))
}

/// Open the database and bring its schema up to date.
pub fn open_database(path: &Path) -> Result<Database, InitError> {
    let db = Database::open(path).map_err(InitError::DatabaseOpen)?;
    migrations::run(db.connection()).map_err(InitError::Migration)?;
    info!("Database ready at {}", path.display());
    Ok(db)
}
