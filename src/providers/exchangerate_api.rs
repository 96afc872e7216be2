use super::util::with_retry;
use crate::core::config::ExchangeRateApiConfig;
use crate::core::error::{RateError, RateResult};
use crate::core::rates::{RateSource, RawRates};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const BASE_CURRENCY: &str = "BRL";

/// Client for the exchangerate-api.com `latest` endpoint, keyed by BRL.
pub struct ExchangeRateApiProvider {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

fn extract_rate(rates: &HashMap<String, f64>, code: &str) -> RateResult<f64> {
    rates
        .get(code)
        .copied()
        .ok_or_else(|| RateError::MalformedResponse(format!("missing rates.{code}")))
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str) -> RateResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent("cambio/0.1")
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| RateError::Fetch(format!("Failed to build HTTP client: {e}")))?;

        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retries: 0,
            retry_delay_ms: 0,
        })
    }

    pub fn from_config(config: &ExchangeRateApiConfig) -> RateResult<Self> {
        Ok(Self::new(&config.base_url)?.with_retry(config.retries, config.retry_delay_ms))
    }

    /// Retries transport failures and non-2xx answers; malformed bodies are not
    /// retried.
    pub fn with_retry(mut self, retries: usize, retry_delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    async fn fetch_body(&self, url: &str) -> RateResult<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            RateError::Fetch(format!(
                "Request error: {e} for base currency: {BASE_CURRENCY}"
            ))
        })?;

        debug!(status = %response.status(), "Received exchange rate response");

        if !response.status().is_success() {
            return Err(RateError::Fetch(format!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                BASE_CURRENCY
            )));
        }

        response
            .text()
            .await
            .map_err(|e| RateError::Fetch(format!("Failed to read response body: {e}")))
    }
}

#[async_trait]
impl RateSource for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self))]
    async fn fetch(&self) -> RateResult<RawRates> {
        let url = format!("{}/v4/latest/{}", self.base_url, BASE_CURRENCY);
        debug!("Requesting exchange rates from {}", url);

        let text = with_retry(|| self.fetch_body(&url), self.retries, self.retry_delay_ms).await?;

        let data: LatestRatesResponse = serde_json::from_str(&text).map_err(|e| {
            RateError::MalformedResponse(format!(
                "Failed to parse JSON response for {BASE_CURRENCY}: {e}"
            ))
        })?;

        let raw = RawRates {
            usd: extract_rate(&data.rates, "USD")?,
            ars: extract_rate(&data.rates, "ARS")?,
        };
        raw.validate()?;

        debug!(usd = raw.usd, ars = raw.ars, "Parsed exchange rates");
        Ok(raw)
    }
}
