mod config;

pub use config::{Config, StretchConfig};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/calmroom[-dev]/` based on CALMROOM_ENV.
///
/// Set CALMROOM_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if there is no home directory or creating the config
/// directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir().ok_or(ConfigError::NoDataDir)?.join(".config");

    let env = std::env::var("CALMROOM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("calmroom-dev")
    } else {
        base_dir.join("calmroom")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
