//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Errors are
//! only raised while building a [`crate::weather::WeatherSystem`] from its configuration; once the
//! simulation runs, numeric edge cases are resolved by the retirement policy instead.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown cloud type '{id}'")]
    UnknownCloudType { id: String },

    #[error("cloud type '{id}' is defined more than once")]
    DuplicateCloudType { id: String },

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
