mod loader;
mod types;
pub mod validation;

pub use loader::{load_config, load_config_from_file, load_config_from_file_with_profile, CONFIG_FILE_NAME};
pub use types::*;

use crate::foundation::EstateError;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "ESTATE_CONFIG_PATH";
pub const DATA_DIR_ENV: &str = "ESTATE_DATA_DIR";

/// Resolves the config path and data dir from the environment, loads, applies `profile`, validates.
pub fn load_app_config(profile: Option<&str>) -> Result<AppConfig, EstateError> {
    let data_dir = resolve_data_dir()?;
    let path = resolve_config_path(&data_dir);
    load_app_config_from_path(&path, profile)
}

pub fn load_app_config_from_path(path: &Path, profile: Option<&str>) -> Result<AppConfig, EstateError> {
    let config = match profile {
        Some(profile) => load_config_from_file_with_profile(path, profile)?,
        None => load_config_from_file(path)?,
    };
    config.validate().map_err(|errors| EstateError::ConfigError(format!("validation failed: {}", errors.join("; "))))?;
    Ok(config)
}

pub fn resolve_config_path(data_dir: &Path) -> PathBuf {
    env_path(CONFIG_PATH_ENV).unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME))
}

pub fn resolve_data_dir() -> Result<PathBuf, EstateError> {
    if let Some(dir) = env_path(DATA_DIR_ENV) {
        return Ok(dir);
    }
    let cwd = std::env::current_dir().map_err(|err| crate::storage_err!("env::current_dir", err))?;
    Ok(cwd.join(".estate"))
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty()).map(PathBuf::from)
}
