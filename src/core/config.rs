use crate::core::model::{DEFAULT_MEP_PERCENT, DEFAULT_TAX_PERCENT};
use crate::core::scheduler::{
    DEFAULT_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL, SchedulerSettings,
    Variant,
};
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const DEFAULT_EXCHANGERATE_API_URL: &str = "https://api.exchangerate-api.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateApiConfig {
    pub base_url: String,
    #[serde(default = "default_retries")]
    pub retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_retries() -> usize {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

impl Default for ExchangeRateApiConfig {
    fn default() -> Self {
        ExchangeRateApiConfig {
            base_url: DEFAULT_EXCHANGERATE_API_URL.to_string(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub exchangerate_api: ExchangeRateApiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_arm_timer_on_failure")]
    pub arm_timer_on_failure: bool,
}

fn default_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_secs()
}

fn default_arm_timer_on_failure() -> bool {
    true
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            interval_secs: default_interval_secs(),
            arm_timer_on_failure: default_arm_timer_on_failure(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RatesConfig {
    #[serde(default = "default_tax_percent")]
    pub tax_percent: f64,
    #[serde(default = "default_mep_percent")]
    pub mep_percent: f64,
}

fn default_tax_percent() -> f64 {
    DEFAULT_TAX_PERCENT
}

fn default_mep_percent() -> f64 {
    DEFAULT_MEP_PERCENT
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            tax_percent: default_tax_percent(),
            mep_percent: default_mep_percent(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub rates: RatesConfig,
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "cambio", "cambio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Rejects values the refresh loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        let interval = self.refresh.interval_secs;
        let (min, max) = (MIN_REFRESH_INTERVAL.as_secs(), MAX_REFRESH_INTERVAL.as_secs());
        if !(min..=max).contains(&interval) {
            bail!("refresh.interval_secs must be between {min} and {max}, got {interval}");
        }
        Ok(())
    }

    pub fn scheduler_settings(&self, variant: Variant) -> SchedulerSettings {
        SchedulerSettings {
            interval: Duration::from_secs(self.refresh.interval_secs),
            arm_timer_on_failure: self.refresh.arm_timer_on_failure,
            variant,
        }
    }
}
