//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, JSON, and GDAL errors, and provides semantic variants
//! for configuration validation and processing failures.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration for band {band}: {reason}")]
    Configuration { band: usize, reason: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Processing error: {0}")]
    Processing(String),
}

impl Error {
    pub fn configuration(band: usize, reason: impl Into<String>) -> Self {
        Error::Configuration {
            band,
            reason: reason.into(),
        }
    }
}
