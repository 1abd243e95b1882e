//! Error types for pwmbank-core.

use thiserror::Error;

/// Error type for pwmbank-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid value for '{name}': {value}. Must be finite")]
    NonFiniteValue { name: String, value: f64 },

    #[error("Invalid four-character code: {0:?}")]
    InvalidFourCc(String),

    #[error("Engine construction failed: {0}")]
    EngineConstruction(String),

    #[error("Parameter tree unavailable")]
    ParameterTreeUnavailable,
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
