use super::{RateOverrides, ui};
use crate::core::config::AppConfig;
use crate::core::conversion::parse_amount;
use crate::core::error::{RateError, RateResult};
use crate::core::scheduler::{SchedulerHandle, Variant};
use anyhow::{Context, Result};
use std::io::BufRead;
use tracing::{debug, warn};

const HELP: &str = "Type an amount in BRL to convert it, `tax <pct>` or `mep <pct>` to adjust \
the percentages, Enter to refresh the rates and `q` (or Ctrl+C) to quit.";

/// A line typed by the user while watching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputCommand {
    Amount(f64),
    TaxPercent(f64),
    MepPercent(f64),
    Refresh,
    Quit,
}

fn parse_percent(name: &str, value: &str) -> RateResult<f64> {
    let percent: f64 = value.trim().parse().map_err(|_| {
        RateError::DegenerateInput(format!("{name} percentage '{value}' is not a number"))
    })?;
    if !percent.is_finite() {
        return Err(RateError::DegenerateInput(format!(
            "{name} percentage must be finite"
        )));
    }
    Ok(percent)
}

pub fn parse_input(line: &str) -> RateResult<InputCommand> {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "" | "r" | "retry" | "refresh" => return Ok(InputCommand::Refresh),
        "q" | "quit" | "exit" => return Ok(InputCommand::Quit),
        _ => {}
    }

    if let Some((keyword, value)) = line.split_once(char::is_whitespace) {
        match keyword.to_lowercase().as_str() {
            "tax" => return parse_percent("Tax", value).map(InputCommand::TaxPercent),
            "mep" => return parse_percent("MEP", value).map(InputCommand::MepPercent),
            _ => {}
        }
    }

    parse_amount(line).map(InputCommand::Amount)
}

/// Forwards a parsed command, returning `false` once the scheduler is gone.
fn dispatch(handle: &SchedulerHandle, command: InputCommand) -> bool {
    match command {
        InputCommand::Amount(amount) => handle.set_amount(amount),
        InputCommand::TaxPercent(percent) => handle.set_tax_percent(percent),
        InputCommand::MepPercent(percent) => handle.set_mep_percent(percent),
        InputCommand::Refresh => handle.retry(),
        InputCommand::Quit => {
            handle.shutdown();
            false
        }
    }
}

/// Reads commands from stdin on a plain thread: a blocking read inside the
/// runtime would hold up shutdown until the next line arrives. End of input
/// only stops reading; the watch itself ends on `q` or Ctrl+C.
fn read_input(handle: SchedulerHandle) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read standard input");
                return;
            }
        };
        match parse_input(&line) {
            Ok(command) => {
                debug!(?command, "User input");
                if !dispatch(&handle, command) {
                    return;
                }
            }
            Err(e) => {
                println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
            }
        }
    }
    debug!("Standard input closed");
}

/// Keeps the rates fresh and converts whatever the user types until they quit.
pub async fn run(
    config: &AppConfig,
    overrides: &RateOverrides,
    amount: Option<&str>,
    variant: Variant,
) -> Result<()> {
    let initial_amount = amount
        .map(parse_amount)
        .transpose()
        .context("Invalid amount")?;

    let (scheduler, handle, commands) =
        super::build_scheduler(config, overrides, variant, true)?;

    println!("{}", ui::style_text(HELP, ui::StyleType::Subtle));

    // Queued commands are served after the initial fetch.
    if let Some(amount) = initial_amount {
        handle.set_amount(amount);
    }

    std::thread::spawn({
        let handle = handle.clone();
        move || read_input(handle)
    });
    // The signal task holds the last handle, so closing stdin keeps the
    // rates refreshing until Ctrl+C.
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received");
            handle.shutdown();
        }
    });

    scheduler.run(commands).await;

    signal_task.abort();
    Ok(())
}
