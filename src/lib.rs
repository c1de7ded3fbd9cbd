pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::dcf::DcfOverrides;
use crate::cli::dividend::GordonArgs;
use crate::cli::fetch::{DataSources, load_config};
use anyhow::Result;
use tracing::info;

pub enum AppCommand {
    Normalize {
        ticker: String,
    },
    Multiples {
        ticker: String,
    },
    Gordon {
        ticker: String,
        args: GordonArgs,
    },
    Dcf {
        ticker: String,
        overrides: DcfOverrides,
        sensitivity: bool,
    },
    Report {
        tickers: Vec<String>,
    },
    Sectors,
}

/// Runs `command` against the configuration at `config_path` (or the default
/// location). `offline` restricts data to the configured reference snapshots.
pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    offline: bool,
) -> Result<()> {
    info!("fairval starting...");
    let config = load_config(config_path)?;
    let sources = DataSources::from_config(&config, offline);
    match command {
        AppCommand::Normalize { ticker } => cli::normalize::run(&config, &sources, &ticker).await,
        AppCommand::Multiples { ticker } => cli::multiples::run(&config, &sources, &ticker).await,
        AppCommand::Gordon { ticker, args } => {
            cli::dividend::run(&config, &sources, &ticker, args).await
        }
        AppCommand::Dcf {
            ticker,
            overrides,
            sensitivity,
        } => cli::dcf::run(&config, &sources, &ticker, overrides, sensitivity).await,
        AppCommand::Report { tickers } => cli::report::run(&config, &sources, &tickers).await,
        AppCommand::Sectors => cli::sectors::run(&config),
    }
}
