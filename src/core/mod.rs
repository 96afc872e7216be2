//! Headless core: rates, conversions and the refresh loop

pub mod config;
pub mod conversion;
pub mod error;
pub mod log;
pub mod model;
pub mod rates;
pub mod scheduler;

// Re-export main types for cleaner imports
pub use conversion::{ComparisonRow, ConversionResult, SimpleConversion};
pub use error::{RateError, RateResult};
pub use model::RateModel;
pub use rates::{RateSource, RawRates};
pub use scheduler::{
    RefreshOutcome, RefreshScheduler, SchedulerHandle, SchedulerSettings, Variant, View,
};
