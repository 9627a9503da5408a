//! Layered configuration loading with figment.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. TOML config file
//! 3. Profile overrides from `[profiles.<name>]`
//! 4. Environment variables (`ESTATE_` prefix, `__` between nesting levels)

use crate::foundation::EstateError;
use crate::infrastructure::config::types::AppConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::value::Dict;
use figment::{Figment, Profile};
use log::{debug, info};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "estate-config.toml";

/// Example: `ESTATE_COORDINATION__SIGNER_POLICY=owners_only` -> `coordination.signer_policy`
const ENV_PREFIX: &str = "ESTATE_";

pub fn load_config(data_dir: &Path) -> Result<AppConfig, EstateError> {
    load_config_from_file(&data_dir.join(CONFIG_FILE_NAME))
}

pub fn load_config_from_file(path: &Path) -> Result<AppConfig, EstateError> {
    info!("loading configuration path={}", path.display());
    let config: AppConfig = figment_base(path).merge(env_provider()).extract()?;
    debug!("configuration loaded party={} notary={} signer_policy={:?}", config.node.party, config.node.notary, config.coordination.signer_policy);
    Ok(config)
}

pub fn load_config_from_file_with_profile(path: &Path, profile: &str) -> Result<AppConfig, EstateError> {
    info!("loading configuration path={} profile={}", path.display(), profile);

    // First pass only reads the `profiles` table out of the file.
    let base: AppConfig = figment_base(path).extract()?;
    let overrides = profile_overrides(&base, profile)?;

    let config: AppConfig = figment_base(path)
        .merge(Serialized::from(overrides, Profile::Default))
        .merge(env_provider())
        .extract()
        .map_err(|err| EstateError::ConfigError(format!("config extraction failed for profile '{profile}': {err}")))?;
    debug!("configuration loaded profile={} party={} notary={}", profile, config.node.party, config.node.notary);
    Ok(config)
}

fn figment_base(path: &Path) -> Figment {
    let figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
    if path.exists() {
        figment.merge(Toml::file(path))
    } else {
        debug!("configuration file missing; using defaults and env only path={}", path.display());
        figment
    }
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

fn profile_overrides(config: &AppConfig, profile: &str) -> Result<Dict, EstateError> {
    let profiles = config.profiles.as_ref().ok_or_else(|| EstateError::ConfigError("no profiles section in config".to_string()))?;
    profiles.get(profile).cloned().ok_or_else(|| EstateError::ConfigError(format!("profile '{profile}' not found in config")))
}
