#[path = "estate-devnet/cli.rs"]
mod cli;
#[path = "estate-devnet/setup.rs"]
mod setup;

use crate::cli::{Cli, Command};
use estate_service::{run_end_to_end, Devnet};
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse_args();
    args.apply_to_env();
    let config = setup::load_config(&args)?;
    setup::init_logging(&args, &config)?;
    info!(
        "estate-devnet starting parties={} notary={} signer_policy={:?}",
        config.devnet.parties.len(),
        config.node.notary,
        config.coordination.signer_policy
    );

    match args.command() {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Scenario { steps } => {
            let devnet = Devnet::from_config(&config)?;
            let result = run_end_to_end(&devnet, steps).await;
            devnet.shutdown();
            match result {
                Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                Err(err) => {
                    error!("scenario failed code={:?} retryable={} error={}", err.code(), err.is_retryable(), err);
                    return Err(err.into());
                }
            }
        }
    }
    Ok(())
}
