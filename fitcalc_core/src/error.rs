//! Error types for the fitcalc_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fitcalc_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// User-correctable form problem (missing, non-positive or out-of-range field)
    #[error("{0}")]
    Validation(String),

    /// Arithmetic precondition violated inside a formula.
    ///
    /// Reaching this from a validated form means the validation layer let
    /// something through that it should not have.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Calculation session misuse
    #[error("Session error: {0}")]
    Session(String),

    /// Preference store error
    #[error("Preference error: {0}")]
    Preference(String),
}

impl Error {
    /// True for errors the user can fix by correcting the form
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
