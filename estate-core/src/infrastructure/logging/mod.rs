//! Logging backend: `log` facade with `log4rs` appenders.

mod consts;

pub use consts::*;

use crate::foundation::EstateError;
use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            policy::compound::{roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy},
            RollingFileAppender,
        },
    },
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::io::IsTerminal;
use std::path::Path;

const CONSOLE_APPENDER: &str = "stderr";
const LOG_FILE_APPENDER: &str = "log_file";
const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

/// Parsed form of a filter expression such as `"info,estate_core=debug,root=warn"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilters {
    pub app_level: LevelFilter,
    pub root_level: LevelFilter,
    pub module_levels: Vec<(String, LevelFilter)>,
}

impl LogFilters {
    pub fn parse(filters: &str) -> Self {
        Self {
            app_level: parse_app_level(filters),
            root_level: parse_root_override(filters).unwrap_or(LevelFilter::Off),
            module_levels: parse_module_levels(filters),
        }
    }
}

/// Installs the global logger.
///
/// Console output goes to stderr. With `log_dir`, a rolling `estate.log` and a warn+ `estate_err.log`
/// are written there too. Our crates log at the bare level in `filters` (default info); third-party
/// crates stay silent unless named (`tokio=debug`) or unless `root=<level>` is given.
///
/// A second call leaves the first logger in place and returns `Ok`.
pub fn init_logger(log_dir: Option<&Path>, filters: &str) -> Result<(), EstateError> {
    let config = build_config(log_dir, &LogFilters::parse(filters))?;
    if log4rs::init_config(config).is_err() {
        log::debug!("logger already installed, keeping existing configuration");
    }
    Ok(())
}

fn build_config(log_dir: Option<&Path>, filters: &LogFilters) -> Result<Config, EstateError> {
    let console_pattern = if std::io::stderr().is_terminal() { LOG_LINE_PATTERN_COLORED } else { LOG_LINE_PATTERN };
    let console = ConsoleAppender::builder().target(Target::Stderr).encoder(Box::new(PatternEncoder::new(console_pattern))).build();

    let mut builder = Config::builder().appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)));
    let mut appenders = vec![CONSOLE_APPENDER.to_string()];

    if let Some(dir) = log_dir {
        builder = builder.appender(Appender::builder().build(LOG_FILE_APPENDER, Box::new(rolling_file(dir, LOG_FILE_NAME)?)));
        builder = builder.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Warn)))
                .build(ERR_LOG_FILE_APPENDER, Box::new(rolling_file(dir, ERR_LOG_FILE_NAME)?)),
        );
        appenders.push(LOG_FILE_APPENDER.to_string());
        appenders.push(ERR_LOG_FILE_APPENDER.to_string());
    }

    for crate_name in WHITELISTED_CRATES {
        if filters.module_levels.iter().any(|(module, _)| module == crate_name) {
            continue;
        }
        builder = builder.logger(Logger::builder().appenders(appenders.clone()).additive(false).build(*crate_name, filters.app_level));
    }
    for (module, level) in &filters.module_levels {
        builder = builder.logger(Logger::builder().appenders(appenders.clone()).additive(false).build(module, *level));
    }

    builder
        .build(Root::builder().appenders(appenders).build(filters.root_level))
        .map_err(|err| EstateError::ConfigError(format!("invalid logger configuration: {err}")))
}

fn rolling_file(dir: &Path, file_name: &str) -> Result<RollingFileAppender, EstateError> {
    let archive_pattern = dir.join(format!("{file_name}.{{}}.gz"));
    let archive_pattern = archive_pattern
        .to_str()
        .ok_or_else(|| EstateError::ConfigError(format!("log directory is not valid utf-8: {}", dir.display())))?;
    let roller = FixedWindowRoller::builder()
        .base(1)
        .build(archive_pattern, LOG_FILE_MAX_ROLLS)
        .map_err(|err| EstateError::ConfigError(format!("log roller: {err}")))?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(LOG_FILE_MAX_SIZE)), Box::new(roller));
    RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
        .build(dir.join(file_name), Box::new(policy))
        .map_err(|err| crate::storage_err!("open_log_file", err))
}

fn parse_app_level(filters: &str) -> LevelFilter {
    filters
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && !part.contains('='))
        .find_map(|part| part.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn parse_root_override(filters: &str) -> Option<LevelFilter> {
    directives(filters).find(|(module, _)| *module == "root").and_then(|(_, level)| level.parse().ok())
}

fn parse_module_levels(filters: &str) -> Vec<(String, LevelFilter)> {
    directives(filters)
        .filter(|(module, _)| *module != "root")
        .filter_map(|(module, level)| level.parse().ok().map(|level| (module.to_string(), level)))
        .collect()
}

/// `module=level` pairs with both sides non-empty.
fn directives(filters: &str) -> impl Iterator<Item = (&str, &str)> {
    filters
        .split(',')
        .filter_map(|part| part.split_once('='))
        .map(|(module, level)| (module.trim(), level.trim()))
        .filter(|(module, level)| !module.is_empty() && !level.is_empty())
}
