//! Terminal rendering of rates, conversions and errors.

use super::ui;
use crate::core::conversion::{ComparisonRow, ConversionResult, SimpleConversion};
use crate::core::error::{RateError, RateResult};
use crate::core::model::RateModel;
use crate::core::rates::{RateSource, RawRates};
use crate::core::scheduler::{SchedulerHandle, View};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use comfy_table::Cell;

pub fn format_rates(model: &RateModel) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Rate"), ui::header_cell("Value")]);
    table.add_row(vec![
        Cell::new("1 BRL"),
        Cell::new(format!("US$ {:.4}", model.brl_to_usd())),
    ]);
    table.add_row(vec![
        Cell::new("1 USD official"),
        Cell::new(format!("$ {:.2} ARS", model.usd_official_to_ars())),
    ]);
    table.add_row(vec![
        Cell::new(format!("1 USD MEP/Blue (+{}%)", model.mep_percent())),
        Cell::new(format!("$ {:.2} ARS", model.usd_mep_to_ars())),
    ]);
    table.add_row(vec![
        Cell::new(format!("1 USD card (+{}%)", model.tax_percent())),
        Cell::new(format!("$ {:.2} ARS", model.usd_card_to_ars())),
    ]);

    format!(
        "{}\n{}",
        ui::style_text("Exchange rates", ui::StyleType::Title),
        table
    )
}

pub fn format_conversion(result: &ConversionResult) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Payment"), ui::header_cell("ARS")]);
    table.add_row(vec![Cell::new("💳 Card"), ui::ars_cell(result.ars_card)]);
    let mep_cell = if result.has_savings() {
        ui::best_ars_cell(result.ars_mep)
    } else {
        ui::ars_cell(result.ars_mep)
    };
    table.add_row(vec![Cell::new("📱 PIX (MEP)"), mep_cell]);

    let mut output = format!(
        "{} R$ {:.2} = US$ {:.2}\n{}",
        ui::style_text("Conversion", ui::StyleType::Title),
        result.brl_amount,
        result.usd,
        table
    );

    if result.has_savings() {
        let percent = result
            .savings_percent
            .map(|p| format!(" ({p:.1}%)"))
            .unwrap_or_default();
        output.push_str(&format!(
            "\nYou save {}{} paying with PIX",
            ui::style_text(
                &format!("$ {:.2} ARS", result.savings),
                ui::StyleType::TotalValue
            ),
            percent
        ));
    }
    output
}

pub fn format_simple_conversion(result: &SimpleConversion) -> String {
    format!(
        "{} R$ {:.2} = US$ {:.2} = {}",
        ui::style_text("Conversion", ui::StyleType::Title),
        result.brl_amount,
        result.usd,
        ui::style_text(
            &format!("$ {:.2} ARS", result.ars_direct),
            ui::StyleType::TotalValue
        )
    )
}

/// Returns `None` when there is nothing to compare.
pub fn format_comparison(rows: &[ComparisonRow]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("BRL"),
        ui::header_cell("💳 Card (ARS)"),
        ui::header_cell("📱 PIX (ARS)"),
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(format!("R$ {}", row.brl_amount)),
            ui::ars_cell(row.ars_card),
            ui::ars_cell(row.ars_mep),
        ]);
    }

    Some(format!(
        "{}\n{}",
        ui::style_text("Quick comparison", ui::StyleType::Title),
        table
    ))
}

pub fn format_error(error: &RateError, retry_available: bool) -> String {
    let mut output = ui::style_text(
        &format!("⚠ Failed to load exchange rates: {error}"),
        ui::StyleType::Error,
    );
    if retry_available {
        output.push_str(&format!(
            "\n{}",
            ui::style_text("Press Enter to retry", ui::StyleType::Subtle)
        ));
    }
    output
}

pub fn format_last_update(timestamp: DateTime<Local>) -> String {
    format!(
        "{} {}",
        ui::style_text("Last update:", ui::StyleType::TotalLabel),
        timestamp.format("%H:%M:%S")
    )
}

/// Prints every render to stdout.
///
/// The retry hint is only shown in interactive mode while a retry handle is
/// alive. The handle itself is not stored: the input loop already owns one and
/// maps an empty line to a retry. One-shot `rates` and `convert` runs drop
/// their handle before fetching, so a failure there just ends the command and
/// the user re-runs it.
pub struct TerminalView {
    interactive: bool,
}

impl TerminalView {
    pub fn new(interactive: bool) -> Self {
        TerminalView { interactive }
    }
}

impl View for TerminalView {
    fn render_rates(&self, model: &RateModel) {
        if self.interactive {
            ui::print_separator();
        }
        println!("{}", format_rates(model));
    }

    fn render_conversion(&self, result: &ConversionResult) {
        println!("{}", format_conversion(result));
    }

    fn render_simple_conversion(&self, result: &SimpleConversion) {
        println!("{}", format_simple_conversion(result));
    }

    fn render_comparison(&self, rows: &[ComparisonRow]) {
        if let Some(table) = format_comparison(rows) {
            println!("{table}");
        }
    }

    fn render_error(&self, error: &RateError, retry: Option<&SchedulerHandle>) {
        println!(
            "{}",
            format_error(error, self.interactive && retry.is_some())
        );
    }

    fn render_last_update(&self, timestamp: DateTime<Local>) {
        println!("{}", format_last_update(timestamp));
    }
}

/// Shows a spinner while the wrapped source fetches.
pub struct SpinnerSource<S> {
    inner: S,
}

impl<S: RateSource> SpinnerSource<S> {
    pub fn new(inner: S) -> Self {
        SpinnerSource { inner }
    }
}

#[async_trait]
impl<S: RateSource> RateSource for SpinnerSource<S> {
    async fn fetch(&self) -> RateResult<RawRates> {
        let pb = ui::new_spinner("Fetching exchange rates...");
        let result = self.inner.fetch().await;
        pb.finish_and_clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversion::{compare_amounts, convert, convert_simple};

    fn reference_model() -> RateModel {
        let mut model = RateModel::default();
        model
            .apply_raw_rates(RawRates { usd: 0.2, ars: 200.0 }, Local::now())
            .unwrap();
        model
    }

    #[test]
    fn test_format_rates_precision() {
        let output = format_rates(&reference_model());
        assert!(output.contains("US$ 0.2000"));
        assert!(output.contains("$ 1000.00 ARS"));
        assert!(output.contains("1 USD MEP/Blue (+10%)"));
        assert!(output.contains("$ 1100.00 ARS"));
        assert!(output.contains("1 USD card (+65%)"));
        assert!(output.contains("$ 1650.00 ARS"));
    }

    #[test]
    fn test_format_conversion_with_savings() {
        let output = format_conversion(&convert(10.0, &reference_model()));
        assert!(output.contains("R$ 10.00 = US$ 2.00"));
        assert!(output.contains("$ 3300.00"));
        assert!(output.contains("$ 2200.00"));
        assert!(output.contains("$ 1100.00 ARS"));
        assert!(output.contains("(33.3%)"));
    }

    #[test]
    fn test_format_empty_conversion_has_no_savings() {
        let output = format_conversion(&ConversionResult::empty());
        assert!(output.contains("$ 0.00"));
        assert!(!output.contains("You save"));
    }

    #[test]
    fn test_format_simple_conversion() {
        let output = format_simple_conversion(&convert_simple(10.0, &reference_model()));
        assert!(output.contains("US$ 2.00"));
        assert!(output.contains("$ 2000.00 ARS"));
    }

    #[test]
    fn test_format_comparison() {
        assert!(format_comparison(&[]).is_none());

        let output = format_comparison(&compare_amounts(&reference_model())).unwrap();
        for label in ["R$ 1", "R$ 5", "R$ 10", "R$ 20", "R$ 50", "R$ 100"] {
            assert!(output.contains(label), "missing {label}");
        }
        assert!(output.contains("$ 33000.00"));
        let first = output.find("R$ 5 ").unwrap();
        let last = output.find("R$ 100").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_format_error_retry_hint() {
        let error = RateError::Fetch("HTTP error: 500".to_string());
        assert!(format_error(&error, true).contains("Press Enter to retry"));
        let one_shot = format_error(&error, false);
        assert!(one_shot.contains("Failed to load exchange rates: Fetch error: HTTP error: 500"));
        assert!(!one_shot.contains("retry"));
    }
}
