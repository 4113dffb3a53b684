pub mod database;
pub mod routine_store;

pub use database::Database;
pub use routine_store::RoutineStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/routinely[-dev]/` based on ROUTINELY_ENV.
///
/// Set ROUTINELY_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ROUTINELY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("routinely-dev")
    } else {
        base_dir.join("routinely")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
