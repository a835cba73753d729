use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the Pathlookup library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A CLI or request argument failed validation.
    #[error("invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// A required platform setting was not provided.
    #[error("missing platform configuration: set {variable}")]
    MissingConfig { variable: String },

    /// A platform setting was provided but could not be interpreted.
    #[error("invalid value {value:?} for {variable}: {message}")]
    InvalidConfig {
        variable: String,
        value: String,
        message: String,
    },

    /// The platform could not be reached (DNS, refused connection, timeout).
    #[error("unable to reach the platform at {url}: {message}")]
    Connectivity { url: String, message: String },

    /// The platform rejected the API token.
    #[error("the platform rejected the credentials (HTTP {status}); check IPF_TOKEN")]
    Authentication { status: u16 },

    /// The platform answered with an unexpected non-success status.
    #[error("platform request to {endpoint} failed with HTTP {status}: {body}")]
    Platform {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A captured response file does not exist.
    #[error("pathlookup file not found at {path}")]
    InputNotFound { path: PathBuf },

    /// A captured response file (or response body) is not valid JSON.
    #[error("failed to parse {origin} as JSON: {source}")]
    InputParse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON document does not have the expected Pathlookup shape.
    #[error("malformed pathlookup response: {message}")]
    MalformedResponse { message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Returns `true` for errors caused by the caller's arguments.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput { .. })
    }
}
