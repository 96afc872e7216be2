//! Error types shared by the rate sources, the model and the scheduler.

use thiserror::Error;

/// Errors raised while loading rates or feeding user input into the model.
#[derive(Debug, Error)]
pub enum RateError {
    /// The rate endpoint could not be reached or answered with a non-2xx status.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The body arrived but the expected rates are missing or unusable.
    #[error("Malformed rate response: {0}")]
    MalformedResponse(String),

    /// An amount or percentage that cannot take part in the arithmetic.
    #[error("Invalid input: {0}")]
    DegenerateInput(String),
}

pub type RateResult<T> = Result<T, RateError>;
