pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::RateOverrides;
use crate::core::config::AppConfig;
use crate::core::scheduler::Variant;
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Rates {
        overrides: RateOverrides,
    },
    Convert {
        amount: String,
        variant: Variant,
        overrides: RateOverrides,
    },
    Watch {
        amount: Option<String>,
        variant: Variant,
        overrides: RateOverrides,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("cambio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Rates { overrides } => cli::rates::run(&config, &overrides).await,
        AppCommand::Convert {
            amount,
            variant,
            overrides,
        } => cli::convert::run(&config, &overrides, &amount, variant).await,
        AppCommand::Watch {
            amount,
            variant,
            overrides,
        } => cli::watch::run(&config, &overrides, amount.as_deref(), variant).await,
    }
}
