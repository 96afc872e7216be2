//! Periodic refresh of the rate model and re-rendering of the view.
//!
//! The scheduler owns the [`RateModel`] and the pending BRL amount. Every
//! trigger (startup, the periodic ticker, a manual retry, user input) ends up
//! in the same fetch, update and render path, and at most one fetch is in
//! flight at any time.

use crate::core::conversion::{self, ComparisonRow, ConversionResult, SimpleConversion};
use crate::core::error::{RateError, RateResult};
use crate::core::model::RateModel;
use crate::core::rates::RateSource;
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Presentation surface driven by the scheduler.
pub trait View: Send + Sync {
    fn render_rates(&self, model: &RateModel);
    fn render_conversion(&self, result: &ConversionResult);
    fn render_simple_conversion(&self, result: &SimpleConversion);
    /// An empty slice means the comparison table should be hidden.
    fn render_comparison(&self, rows: &[ComparisonRow]);
    /// `retry` re-enters the fetch path when invoked. It is `None` when no
    /// handle to the command loop is alive, so nothing could serve a retry.
    fn render_error(&self, error: &RateError, retry: Option<&SchedulerHandle>);
    fn render_last_update(&self, timestamp: DateTime<Local>);
}

/// Which conversion the view is fed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Card and MEP dollars side by side, with the comparison table.
    #[default]
    Extended,
    /// A single direct USD/ARS conversion.
    Simple,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub interval: Duration,
    /// Arm the periodic refresh even if the first fetch fails.
    pub arm_timer_on_failure: bool,
    pub variant: Variant,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        SchedulerSettings {
            interval: DEFAULT_REFRESH_INTERVAL,
            arm_timer_on_failure: true,
            variant: Variant::Extended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Refresh,
    SetAmount(f64),
    SetTaxPercent(f64),
    SetMepPercent(f64),
    Shutdown,
}

/// Cloneable sender feeding commands into [`RefreshScheduler::run`].
///
/// Every method returns `false` once the scheduler is gone. The loop stops
/// when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    pub fn retry(&self) -> bool {
        self.send(Command::Refresh)
    }

    pub fn set_amount(&self, amount: f64) -> bool {
        self.send(Command::SetAmount(amount))
    }

    pub fn set_tax_percent(&self, percent: f64) -> bool {
        self.send(Command::SetTaxPercent(percent))
    }

    pub fn set_mep_percent(&self, percent: f64) -> bool {
        self.send(Command::SetMepPercent(percent))
    }

    pub fn shutdown(&self) -> bool {
        self.send(Command::Shutdown)
    }

    fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }
}

pub fn command_channel() -> (SchedulerHandle, mpsc::UnboundedReceiver<Command>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SchedulerHandle { tx }, rx)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    Failed,
    /// Another fetch was already in flight; nothing was fetched.
    Coalesced,
}

struct Session {
    model: RateModel,
    amount: Option<f64>,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RefreshScheduler<S, V> {
    source: S,
    view: V,
    session: Mutex<Session>,
    in_flight: AtomicBool,
    timer_armed: AtomicBool,
    settings: SchedulerSettings,
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl<S: RateSource, V: View> RefreshScheduler<S, V> {
    pub fn new(
        source: S,
        view: V,
        model: RateModel,
        settings: SchedulerSettings,
        handle: &SchedulerHandle,
    ) -> Self {
        RefreshScheduler {
            source,
            view,
            session: Mutex::new(Session {
                model,
                amount: None,
            }),
            in_flight: AtomicBool::new(false),
            timer_armed: AtomicBool::new(false),
            settings,
            commands: handle.tx.downgrade(),
        }
    }

    /// A sender for [`RefreshScheduler::run`]'s command channel, as long as
    /// some caller still holds one.
    pub fn handle(&self) -> Option<SchedulerHandle> {
        self.commands.upgrade().map(|tx| SchedulerHandle { tx })
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer_armed.load(Ordering::Acquire)
    }

    pub async fn model(&self) -> RateModel {
        self.session.lock().await.model.clone()
    }

    pub async fn amount(&self) -> Option<f64> {
        self.session.lock().await.amount
    }

    /// Fetches fresh rates and re-renders everything that depends on them.
    ///
    /// Errors are handed to the view together with a retry handle and never
    /// propagate further.
    pub async fn refresh(&self) -> RefreshOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Fetch already in flight, coalescing refresh");
            return RefreshOutcome::Coalesced;
        }
        let _guard = InFlightGuard(&self.in_flight);

        debug!("Fetching exchange rates");
        let fetched = self.source.fetch().await;

        let mut session = self.session.lock().await;
        let applied = fetched.and_then(|raw| session.model.apply_raw_rates(raw, Local::now()));

        match applied {
            Ok(()) => {
                info!(
                    brl_to_usd = session.model.brl_to_usd(),
                    usd_official_to_ars = session.model.usd_official_to_ars(),
                    "Exchange rates updated"
                );
                self.view.render_rates(&session.model);
                if let Some(timestamp) = session.model.last_update() {
                    self.view.render_last_update(timestamp);
                }
                if let Some(amount) = session.amount {
                    self.render_amount(&session.model, amount);
                }
                self.arm_timer();
                RefreshOutcome::Updated
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh exchange rates");
                self.view.render_error(&e, self.handle().as_ref());
                if self.settings.arm_timer_on_failure {
                    self.arm_timer();
                }
                RefreshOutcome::Failed
            }
        }
    }

    pub async fn set_amount(&self, amount: f64) {
        let mut session = self.session.lock().await;
        session.amount = Some(amount);
        self.render_amount(&session.model, amount);
    }

    pub async fn set_tax_percent(&self, percent: f64) -> RateResult<()> {
        let mut session = self.session.lock().await;
        session.model.set_tax_percent(percent)?;
        debug!(percent, "Tax percentage updated");
        self.render_after_percent_change(&session);
        Ok(())
    }

    pub async fn set_mep_percent(&self, percent: f64) -> RateResult<()> {
        let mut session = self.session.lock().await;
        session.model.set_mep_percent(percent)?;
        debug!(percent, "MEP percentage updated");
        self.render_after_percent_change(&session);
        Ok(())
    }

    /// Runs the initial fetch, then serves the periodic ticker and the command
    /// channel until [`Command::Shutdown`] arrives.
    pub async fn run(&self, mut commands: mpsc::UnboundedReceiver<Command>) {
        info!("Starting refresh loop");
        self.refresh().await;

        let mut ticker: Option<Interval> = None;
        loop {
            if ticker.is_none() && self.is_timer_armed() {
                ticker = Some(self.new_ticker());
            }

            tokio::select! {
                _ = next_tick(&mut ticker) => {
                    debug!("Periodic refresh");
                    self.refresh().await;
                }
                command = commands.recv() => match command {
                    Some(Command::Shutdown) => break,
                    None => {
                        debug!("All scheduler handles dropped");
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                },
            }
        }
        info!("Refresh loop stopped");
    }

    async fn handle_command(&self, command: Command) {
        match command {
            Command::Refresh => {
                self.refresh().await;
            }
            Command::SetAmount(amount) => self.set_amount(amount).await,
            Command::SetTaxPercent(percent) => {
                if let Err(e) = self.set_tax_percent(percent).await {
                    warn!(error = %e, "Rejected tax percentage");
                }
            }
            Command::SetMepPercent(percent) => {
                if let Err(e) = self.set_mep_percent(percent).await {
                    warn!(error = %e, "Rejected MEP percentage");
                }
            }
            Command::Shutdown => {}
        }
    }

    fn render_after_percent_change(&self, session: &Session) {
        self.view.render_rates(&session.model);
        self.render_amount(&session.model, session.amount.unwrap_or(0.0));
    }

    fn render_amount(&self, model: &RateModel, amount: f64) {
        match self.settings.variant {
            Variant::Extended => {
                let result = conversion::convert(amount, model);
                self.view.render_conversion(&result);
                if result.is_empty() {
                    self.view.render_comparison(&[]);
                } else {
                    self.view.render_comparison(&conversion::compare_amounts(model));
                }
            }
            Variant::Simple => {
                self.view
                    .render_simple_conversion(&conversion::convert_simple(amount, model));
            }
        }
    }

    fn arm_timer(&self) {
        if !self.timer_armed.swap(true, Ordering::AcqRel) {
            info!(
                interval_secs = self.settings.interval.as_secs(),
                "Periodic refresh armed"
            );
        }
    }

    fn new_ticker(&self) -> Interval {
        let period = self
            .settings
            .interval
            .clamp(MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL);
        if period != self.settings.interval {
            warn!(
                requested_secs = self.settings.interval.as_secs_f64(),
                used_secs = period.as_secs(),
                "Refresh interval out of range, clamped"
            );
        }
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
