// Error types shared by the executor, the transport and the API callers.

use thiserror::Error;

/// A single exchange with the backend could not be completed.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network or request execution error from `reqwest` (DNS, refused
    /// connection, timeout, truncated body).
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),
    /// A request header could not be encoded.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
    /// Any other transport-level fault. Used by non-HTTP transports.
    #[error("{0}")]
    Other(String),
}

/// Returned by the executor when the transport itself failed mid-attempt.
/// No further attempts are made once this happens.
#[derive(Debug, Error)]
#[error("request to {url} failed on attempt {attempt}: {source}")]
pub struct TransportFailure {
    pub url: String,
    pub attempt: u32,
    #[source]
    pub source: TransportError,
}

/// Errors surfaced to the user by the upload / identify / songs commands.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The local audio file is missing.
    #[error("file does not exist: {0}")]
    MissingFile(String),
    /// The local audio file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Invalid user input, rejected before any request is made.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The backend could not be reached at all.
    #[error("service unavailable: {0}")]
    Unavailable(#[from] TransportFailure),
    /// The backend answered with a structured error (400, 480-482, 500,
    /// or a 200 carrying an `error` field).
    #[error("error {status}: {message}")]
    Application { status: u16, message: String },
    /// Any other status that survived the retry budget.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    /// A 200 response whose body did not have the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),
}
