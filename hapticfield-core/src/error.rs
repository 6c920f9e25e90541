//! Error types for hapticfield

use thiserror::Error;

/// Main error type for hapticfield operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Scene error: {0}")]
    Scene(String),
}

/// Result type alias for hapticfield operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
