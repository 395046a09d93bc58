//! Error types for flightops.

use thiserror::Error;

/// Main error type for store and configuration operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (connection refused, DNS, TLS...)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Store backend returned an error response
    #[error("API error: {status} - {kind}: {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Data returned by the store could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Build an API error from a status code and a backend error body.
    ///
    /// DynamoDB-style bodies carry the exception name in `__type`
    /// (e.g. `com.amazonaws.dynamodb.v20120810#ResourceNotFoundException`);
    /// only the part after `#` is kept.
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

        let kind = parsed
            .as_ref()
            .and_then(|v| v.get("__type"))
            .and_then(|v| v.as_str())
            .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
            .unwrap_or_else(|| format!("HTTP{}", status));

        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message").or_else(|| v.get("Message")))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());

        Error::Api {
            status,
            kind,
            message,
        }
    }

    /// Short name of the failure, used in diagnostic reports.
    pub fn kind(&self) -> &str {
        match self {
            Error::Http(_) => "NetworkingError",
            Error::Api { kind, .. } => kind,
            Error::Serialization(_) => "SerializationError",
            Error::Config(_) => "ConfigurationError",
            Error::Storage(_) => "StorageError",
            Error::InvalidData(_) => "InvalidDataError",
            Error::Other(_) => "Error",
        }
    }
}

/// Result type alias for flightops operations.
pub type Result<T> = std::result::Result<T, Error>;
