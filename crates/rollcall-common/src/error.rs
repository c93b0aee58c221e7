//! Error types shared across Rollcall crates

use thiserror::Error;

/// Result type alias for Rollcall operations
pub type Result<T> = std::result::Result<T, RollcallError>;

/// Errors raised outside of request handling: startup, configuration and
/// logging setup.
#[derive(Error, Debug)]
pub enum RollcallError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Invalid value '{value}' for {setting}")]
    InvalidSetting { setting: &'static str, value: String },
}

impl RollcallError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_setting(setting: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting,
            value: value.into(),
        }
    }
}
