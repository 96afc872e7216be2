//! Exchange rate source abstractions

use crate::core::error::{RateError, RateResult};
use async_trait::async_trait;

/// Rates quoted against one BRL, as returned by the remote API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRates {
    /// USD per 1 BRL.
    pub usd: f64,
    /// ARS per 1 BRL.
    pub ars: f64,
}

impl RawRates {
    /// Checks that the pair can produce a finite official USD/ARS rate.
    pub fn validate(&self) -> RateResult<()> {
        if !self.usd.is_finite() || !self.ars.is_finite() {
            return Err(RateError::MalformedResponse(format!(
                "non-finite rate (USD: {}, ARS: {})",
                self.usd, self.ars
            )));
        }
        if self.usd < 0.0 || self.ars < 0.0 {
            return Err(RateError::MalformedResponse(format!(
                "negative rate (USD: {}, ARS: {})",
                self.usd, self.ars
            )));
        }
        if self.usd == 0.0 {
            return Err(RateError::MalformedResponse(
                "USD rate is zero, official USD/ARS rate is undefined".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> RateResult<RawRates>;
}
