//! Pure conversions of BRL amounts into ARS through the rates held by a
//! [`RateModel`].
use crate::core::error::{RateError, RateResult};
use crate::core::model::RateModel;

/// Round BRL amounts shown in the quick comparison table, in display order.
pub const COMPARISON_AMOUNTS: [f64; 6] = [1.0, 5.0, 10.0, 20.0, 50.0, 100.0];

/// Outcome of converting one BRL amount through the card and MEP dollars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionResult {
    pub brl_amount: f64,
    pub usd: f64,
    pub ars_card: f64,
    pub ars_mep: f64,
    pub savings: f64,
    /// `None` when there is no card amount to compare against.
    pub savings_percent: Option<f64>,
}

impl ConversionResult {
    /// The zero state shown when there is no positive amount to convert.
    pub fn empty() -> Self {
        ConversionResult {
            brl_amount: 0.0,
            usd: 0.0,
            ars_card: 0.0,
            ars_mep: 0.0,
            savings: 0.0,
            savings_percent: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.brl_amount <= 0.0
    }

    /// True when paying at the MEP rate is actually cheaper than by card.
    pub fn has_savings(&self) -> bool {
        self.savings > 0.0
    }
}

/// Conversion for the simple variant, which has no card/MEP split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleConversion {
    pub brl_amount: f64,
    pub usd: f64,
    pub ars_direct: f64,
}

/// One line of the quick comparison table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonRow {
    pub brl_amount: f64,
    pub ars_card: f64,
    pub ars_mep: f64,
}

fn is_convertible(brl_amount: f64) -> bool {
    brl_amount.is_finite() && brl_amount > 0.0
}

/// Returns `(usd, ars_card, ars_mep)` for a BRL amount.
fn quote(brl_amount: f64, model: &RateModel) -> (f64, f64, f64) {
    let usd = brl_amount * model.brl_to_usd();
    (usd, usd * model.usd_card_to_ars(), usd * model.usd_mep_to_ars())
}

/// Converts `brl_amount` into ARS at both the card and the MEP rate.
///
/// Amounts that are zero, negative or not finite produce
/// [`ConversionResult::empty`].
pub fn convert(brl_amount: f64, model: &RateModel) -> ConversionResult {
    if !is_convertible(brl_amount) {
        return ConversionResult::empty();
    }

    let (usd, ars_card, ars_mep) = quote(brl_amount, model);
    let savings = ars_card - ars_mep;
    let savings_percent = (ars_card != 0.0).then(|| savings / ars_card * 100.0);

    ConversionResult {
        brl_amount,
        usd,
        ars_card,
        ars_mep,
        savings,
        savings_percent,
    }
}

pub fn convert_simple(brl_amount: f64, model: &RateModel) -> SimpleConversion {
    if !is_convertible(brl_amount) {
        return SimpleConversion {
            brl_amount: 0.0,
            usd: 0.0,
            ars_direct: 0.0,
        };
    }

    let usd = brl_amount * model.brl_to_usd();
    SimpleConversion {
        brl_amount,
        usd,
        ars_direct: usd * model.usd_to_ars(),
    }
}

/// Quotes every amount in [`COMPARISON_AMOUNTS`], in that order.
pub fn compare_amounts(model: &RateModel) -> [ComparisonRow; 6] {
    COMPARISON_AMOUNTS.map(|brl_amount| {
        let (_, ars_card, ars_mep) = quote(brl_amount, model);
        ComparisonRow {
            brl_amount,
            ars_card,
            ars_mep,
        }
    })
}

/// Parses an amount typed by the user.
///
/// Blank input means "nothing to convert" and yields zero. Anything that is not
/// a finite, non-negative number is rejected.
pub fn parse_amount(input: &str) -> RateResult<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }

    let amount: f64 = trimmed
        .parse()
        .map_err(|_| RateError::DegenerateInput(format!("'{trimmed}' is not a number")))?;

    if !amount.is_finite() {
        return Err(RateError::DegenerateInput(format!(
            "'{trimmed}' is not a finite amount"
        )));
    }
    if amount < 0.0 {
        return Err(RateError::DegenerateInput(format!(
            "amount must not be negative, got {amount}"
        )));
    }
    Ok(amount)
}
