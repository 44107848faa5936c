//! Error types for the scoring service and its consumers

use thiserror::Error;

/// Message returned when a prediction request carries no feature vector.
pub const MISSING_FEATURES: &str = "Missing 'features' key in request data";

/// Failures on the serving side.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// Missing or malformed request field. Reported to the caller as 400.
    #[error("{0}")]
    Validation(String),

    /// The model call (or coercing its input) failed. Reported as 500.
    #[error("{0}")]
    Inference(String),

    /// The model artifact could not be loaded; the process must not serve.
    #[error("startup failure: {0}")]
    Startup(String),
}

impl ScoringError {
    /// Request body has no `features` key
    pub fn missing_features() -> Self {
        Self::Validation(MISSING_FEATURES.to_string())
    }
}

/// Failures on the consumer side. All of them mean "no decision available".
#[derive(Error, Debug)]
pub enum ClientError {
    /// The feature provider has no record for the selected entity
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// The service could not be reached
    #[error("failed to reach inference service: {0}")]
    Transport(String),

    /// The service answered with a non-200 status
    #[error("inference service returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The service answered 200 with an unreadable body
    #[error("invalid response from inference service: {0}")]
    Decode(String),
}

pub type ScoringResult<T> = Result<T, ScoringError>;
