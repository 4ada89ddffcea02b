//! Registry client error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("network error: {0}")]
    Network(String),

    #[error("registry returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse registry response: {0}")]
    Parse(String),

    #[error("invalid agent address \"{0}\"")]
    InvalidAddress(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RegistryError::Parse(err.to_string())
        } else {
            RegistryError::Network(err.to_string())
        }
    }
}
