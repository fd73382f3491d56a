mod config;
pub mod database;

pub use config::{Config, FirestoreSection, IdentityConfig, LoggingConfig, StoreBackend, StoreConfig, TimerConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `POMOTALLY_DATA_DIR` overrides the location outright. Otherwise the
/// directory is `~/.config/pomotally[-dev]/`, with POMOTALLY_ENV=dev
/// selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOTALLY_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMOTALLY_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pomotally-dev")
            } else {
                base_dir.join("pomotally")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
