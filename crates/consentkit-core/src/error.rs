//! Error types for consentkit.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Bad network connection. Please ensure you are connected to the internet and try again")]
    NetworkUnavailable,

    #[error("Consent status fetch failed: {0}")]
    FetchFailed(String),

    #[error("Malformed consent status response: {0}")]
    MalformedResponse(String),

    #[error("Sink {sink} failed: {message}")]
    Sink { sink: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a sink failure for the named integration.
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sink {
            sink: sink.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
