//! Current exchange rates and the card/MEP rates derived from them.

use crate::core::error::{RateError, RateResult};
use crate::core::rates::RawRates;
use chrono::{DateTime, Local};
use tracing::debug;

pub const DEFAULT_TAX_PERCENT: f64 = 65.0;
pub const DEFAULT_MEP_PERCENT: f64 = 10.0;

/// Holds the fetched BRL/USD and USD/ARS rates plus the derived card and MEP
/// dollar rates.
///
/// Derived rates are recomputed whenever the official rate or the matching
/// percentage changes, so fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct RateModel {
    brl_to_usd: f64,
    usd_official_to_ars: f64,
    usd_card_to_ars: f64,
    usd_mep_to_ars: f64,
    tax_percent: f64,
    mep_percent: f64,
    last_update: Option<DateTime<Local>>,
}

fn apply_percent(rate: f64, percent: f64) -> f64 {
    rate * (1.0 + percent / 100.0)
}

fn ensure_finite(name: &str, value: f64) -> RateResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RateError::DegenerateInput(format!(
            "{name} must be a finite number, got {value}"
        )))
    }
}

impl RateModel {
    /// Creates an empty model (all rates zero) with the given percentages.
    pub fn new(tax_percent: f64, mep_percent: f64) -> Self {
        RateModel {
            brl_to_usd: 0.0,
            usd_official_to_ars: 0.0,
            usd_card_to_ars: 0.0,
            usd_mep_to_ars: 0.0,
            tax_percent,
            mep_percent,
            last_update: None,
        }
    }

    pub fn brl_to_usd(&self) -> f64 {
        self.brl_to_usd
    }

    pub fn usd_official_to_ars(&self) -> f64 {
        self.usd_official_to_ars
    }

    /// Direct USD/ARS rate used by the simple variant.
    pub fn usd_to_ars(&self) -> f64 {
        self.usd_official_to_ars
    }

    pub fn usd_card_to_ars(&self) -> f64 {
        self.usd_card_to_ars
    }

    pub fn usd_mep_to_ars(&self) -> f64 {
        self.usd_mep_to_ars
    }

    /// ARS paid per BRL when paying by card.
    pub fn brl_to_ars_card(&self) -> f64 {
        self.brl_to_usd * self.usd_card_to_ars
    }

    /// ARS paid per BRL when paying through a MEP-priced app.
    pub fn brl_to_ars_mep(&self) -> f64 {
        self.brl_to_usd * self.usd_mep_to_ars
    }

    pub fn tax_percent(&self) -> f64 {
        self.tax_percent
    }

    pub fn mep_percent(&self) -> f64 {
        self.mep_percent
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    /// Replaces the fetched rates and stamps the update time.
    ///
    /// The raw rates are validated first; on error the model is left as it was.
    pub fn apply_raw_rates(
        &mut self,
        raw: RawRates,
        fetched_at: DateTime<Local>,
    ) -> RateResult<()> {
        raw.validate()?;

        self.brl_to_usd = raw.usd;
        self.usd_official_to_ars = raw.ars / raw.usd;
        self.usd_card_to_ars = apply_percent(self.usd_official_to_ars, self.tax_percent);
        self.usd_mep_to_ars = apply_percent(self.usd_official_to_ars, self.mep_percent);
        self.last_update = Some(fetched_at);

        debug!(
            brl_to_usd = self.brl_to_usd,
            usd_official_to_ars = self.usd_official_to_ars,
            usd_card_to_ars = self.usd_card_to_ars,
            usd_mep_to_ars = self.usd_mep_to_ars,
            "Applied fetched rates"
        );
        Ok(())
    }

    pub fn set_tax_percent(&mut self, percent: f64) -> RateResult<()> {
        ensure_finite("tax percentage", percent)?;
        self.tax_percent = percent;
        self.usd_card_to_ars = apply_percent(self.usd_official_to_ars, percent);
        Ok(())
    }

    pub fn set_mep_percent(&mut self, percent: f64) -> RateResult<()> {
        ensure_finite("MEP percentage", percent)?;
        self.mep_percent = percent;
        self.usd_mep_to_ars = apply_percent(self.usd_official_to_ars, percent);
        Ok(())
    }
}

impl Default for RateModel {
    fn default() -> Self {
        Self::new(DEFAULT_TAX_PERCENT, DEFAULT_MEP_PERCENT)
    }
}
