use super::RateOverrides;
use crate::core::config::AppConfig;
use crate::core::scheduler::{RefreshOutcome, Variant};
use anyhow::{Result, bail};

/// Fetches the rates once and prints the rate panel.
pub async fn run(config: &AppConfig, overrides: &RateOverrides) -> Result<()> {
    let (scheduler, _, _) = super::build_scheduler(config, overrides, Variant::Extended, false)?;

    match scheduler.refresh().await {
        RefreshOutcome::Updated => Ok(()),
        outcome => bail!("Could not load exchange rates ({outcome:?})"),
    }
}
