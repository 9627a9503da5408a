use crate::cli::Cli;
use estate_core::foundation::EstateError;
use estate_core::infrastructure::config::{load_app_config, AppConfig};
use estate_core::infrastructure::logging::init_logger;
use log::info;
use std::path::PathBuf;

/// Loads and validates the config; a missing file leaves the compiled defaults in place.
pub fn load_config(args: &Cli) -> Result<AppConfig, EstateError> {
    let profile = args.profile.as_deref().map(str::trim).filter(|profile| !profile.is_empty());
    if let Some(profile) = profile {
        info!("loading config profile profile={}", profile);
    }
    load_app_config(profile)
}

pub fn init_logging(args: &Cli, config: &AppConfig) -> Result<(), EstateError> {
    let filters = args.log_level.clone().unwrap_or_else(|| config.logging.filters.clone());
    let log_dir = args.log_dir.clone().or_else(|| config.logging.log_dir.as_ref().map(PathBuf::from));
    init_logger(log_dir.as_deref(), &filters)
}
