use thiserror::Error;

use crate::timeseries::Time;

/// Error type for invalid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SoilFracError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Invalid timeseries: {0}")]
    InvalidTimeseries(String),
    #[error("Extrapolation is not allowed. Target={target}, interpolation range=[{min}, {max}]")]
    ExtrapolationNotAllowed { target: Time, min: Time, max: Time },
    #[error("Integration failed at t={time}: {reason}")]
    IntegrationFailure { time: Time, reason: String },
    #[error("Pool {0} is not tracked by this simulation")]
    MissingPool(String),
    #[error("Could not read configuration: {0}")]
    Config(String),
}

/// Convenience type for `Result<T, SoilFracError>`.
pub type SoilFracResult<T> = Result<T, SoilFracError>;
