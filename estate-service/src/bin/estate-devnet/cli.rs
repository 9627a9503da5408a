use clap::{Parser, Subcommand};
use estate_core::infrastructure::config::{CONFIG_PATH_ENV, DATA_DIR_ENV};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "estate-devnet")]
#[command(about = "Runs the property agreement protocol on an in-process network", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Apply `[profiles.<name>]` overrides from the config file
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Log filters, e.g. `info` or `debug,estate_core=trace`; overrides `logging.filters`
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Also write rolling log files here; overrides `logging.log_dir`
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create, sell, rent, cancel the rent, then try an empty sale
    Scenario {
        /// Stop after this many committed transitions (1-4)
        #[arg(long, default_value_t = 4)]
        steps: usize,
    },
    /// Print the effective configuration as JSON
    Config,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn apply_to_env(&self) {
        if let Some(config_path) = &self.config {
            std::env::set_var(CONFIG_PATH_ENV, config_path);
        }
        if let Some(data_dir) = &self.data_dir {
            std::env::set_var(DATA_DIR_ENV, data_dir);
        }
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Scenario { steps: 4 })
    }
}
