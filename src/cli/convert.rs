use super::RateOverrides;
use crate::core::config::AppConfig;
use crate::core::conversion::parse_amount;
use crate::core::scheduler::{RefreshOutcome, Variant};
use anyhow::{Context, Result, bail};
use tracing::debug;

/// Fetches the rates once, then converts `amount` and prints the result along
/// with the quick comparison table.
pub async fn run(
    config: &AppConfig,
    overrides: &RateOverrides,
    amount: &str,
    variant: Variant,
) -> Result<()> {
    let amount = parse_amount(amount).with_context(|| format!("Invalid amount: {amount}"))?;
    debug!(amount, ?variant, "Converting BRL amount");

    let (scheduler, _, _) = super::build_scheduler(config, overrides, variant, false)?;

    match scheduler.refresh().await {
        RefreshOutcome::Updated => {
            scheduler.set_amount(amount).await;
            Ok(())
        }
        outcome => bail!("Could not load exchange rates ({outcome:?})"),
    }
}
