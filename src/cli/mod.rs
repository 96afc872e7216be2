pub mod convert;
pub mod rates;
pub mod setup;
pub mod ui;
pub mod view;
pub mod watch;

use crate::core::config::AppConfig;
use crate::core::model::RateModel;
use crate::core::scheduler::{self, Command, RefreshScheduler, SchedulerHandle, Variant};
use crate::providers::exchangerate_api::ExchangeRateApiProvider;
use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use view::{SpinnerSource, TerminalView};

/// Percentages given on the command line, taking precedence over the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateOverrides {
    pub tax_percent: Option<f64>,
    pub mep_percent: Option<f64>,
}

pub type TerminalScheduler = RefreshScheduler<SpinnerSource<ExchangeRateApiProvider>, TerminalView>;

fn initial_model(config: &AppConfig, overrides: &RateOverrides) -> Result<RateModel> {
    let mut model = RateModel::default();
    model
        .set_tax_percent(overrides.tax_percent.unwrap_or(config.rates.tax_percent))
        .context("Invalid tax percentage")?;
    model
        .set_mep_percent(overrides.mep_percent.unwrap_or(config.rates.mep_percent))
        .context("Invalid MEP percentage")?;
    Ok(model)
}

/// Wires the terminal scheduler. The scheduler only keeps a weak reference to
/// the command channel, so dropping the returned handle disables retries and
/// lets [`RefreshScheduler::run`] end once the channel drains.
pub(crate) fn build_scheduler(
    config: &AppConfig,
    overrides: &RateOverrides,
    variant: Variant,
    interactive: bool,
) -> Result<(TerminalScheduler, SchedulerHandle, UnboundedReceiver<Command>)> {
    let provider = ExchangeRateApiProvider::from_config(&config.providers.exchangerate_api)
        .context("Failed to create exchange rate provider")?;
    let model = initial_model(config, overrides)?;
    let (handle, commands) = scheduler::command_channel();

    let scheduler = RefreshScheduler::new(
        SpinnerSource::new(provider),
        TerminalView::new(interactive),
        model,
        config.scheduler_settings(variant),
        &handle,
    );
    Ok((scheduler, handle, commands))
}
