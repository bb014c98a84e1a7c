//! Error types for the collector.
//!
//! Every failure in a run maps onto one [`CollectorError`] variant. Nothing is
//! retried: the first error propagates out of `main` and the process exits
//! non-zero with no points written (the sink write is a single batched call).

use thiserror::Error;

/// Result type alias for collector operations
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Error types for collector operations
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// XML parsing errors
    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected response structure
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Datapoint decode failures (bad numeric value, out-of-range enum code)
    #[error("Decode error: {0}")]
    Decode(String),

    /// A classified device is missing a datapoint its metric schema requires
    #[error("Missing datapoint: {0}")]
    MissingDatapoint(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sink write failures
    #[error("InfluxDB write failed: {0}")]
    InfluxWrite(String),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl CollectorError {
    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a parsing error
    pub fn parsing<S: Into<String>>(msg: S) -> Self {
        Self::Parsing(msg.into())
    }

    /// Create a decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a missing-datapoint error
    pub fn missing_datapoint<S: Into<String>>(msg: S) -> Self {
        Self::MissingDatapoint(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

impl From<config::ConfigError> for CollectorError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
