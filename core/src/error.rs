//! Error types for the ReqRes client.
//!
//! # Design
//! HTTP error statuses are never errors at the `ApiClient` level: a 400 or a
//! 404 is a valid `HttpResponse` for a test to assert against. Only failures
//! to complete the exchange (`Timeout`, `Transport`) come back as `Err` from
//! `send`. The typed `ReqresApi` layer is stricter and maps unexpected
//! statuses to `NotFound`, `Rejected` or `HttpError`.

use std::time::Duration;

use crate::http::HttpMethod;
use crate::schema::SchemaError;

/// Errors returned by the client and the typed endpoint layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The exchange did not complete within the configured timeout.
    #[error("{method} {url} timed out after {timeout:?}")]
    Timeout {
        method: HttpMethod,
        url: String,
        timeout: Duration,
    },

    /// DNS, connect, TLS or I/O failure.
    #[error("{method} {url} failed: {message}")]
    Transport {
        method: HttpMethod,
        url: String,
        message: String,
    },

    /// The request could not be assembled (bad header name, etc).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server refused the request with an `{"error": "..."}` body.
    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Any other unexpected status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ApiError {
    /// True for failures of the exchange itself rather than of its content.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Timeout { .. } | ApiError::Transport { .. })
    }
}
