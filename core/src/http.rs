//! HTTP transport types.
//!
//! # Design
//! Requests and responses are plain data. `ApiClient` resolves a logical
//! request into an `HttpRequest` without touching the network, and a
//! `Transport` turns it into an `HttpResponse`. Keeping the two halves as data
//! lets unit tests inspect exactly what would go on the wire.
//!
//! An `HttpResponse` is immutable once built. It keeps the body bytes exactly
//! as received, plus a text view with invalid UTF-8 replaced. The body is
//! parsed as JSON a single time at construction; a body that is not JSON
//! simply has no parsed form, and callers fall back to the text.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved HTTP request.
///
/// `url` already carries the encoded query string and `headers` already hold
/// the merged default, credential and per-call headers.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Borrowed view of a response body: parsed JSON when possible, raw text
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Body<'a> {
    Json(&'a Value),
    Text(&'a str),
}

/// A received HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: u16,
    headers: Vec<(String, String)>,
    raw: Vec<u8>,
    text: String,
    parsed: Option<Value>,
}

impl HttpResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        let raw = body.into();
        let text = String::from_utf8_lossy(&raw).into_owned();
        let parsed = serde_json::from_slice(&raw).ok();
        Self {
            status,
            headers,
            raw,
            text,
            parsed,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body bytes exactly as received.
    pub fn bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Body as text, with invalid UTF-8 sequences replaced. Empty for
    /// responses such as `204 No Content`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The body parsed as JSON, or `None` when it is empty or not JSON.
    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed.as_ref()
    }

    pub fn json_or_text(&self) -> Body<'_> {
        match &self.parsed {
            Some(value) => Body::Json(value),
            None => Body::Text(&self.text),
        }
    }

    /// Decode the body into a typed value.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.raw).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    pub fn is_json(&self) -> bool {
        is_json_response(self)
    }
}

/// True when the response declares a JSON media type.
pub fn is_json_response(response: &HttpResponse) -> bool {
    response.content_type().is_some_and(is_json_content_type)
}

/// Permissive JSON media-type check. Vendor types such as
/// `application/vnd.api+json` and the legacy `text/json` are accepted.
pub fn is_json_content_type(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("application/json") || ct.ends_with("+json") || ct.contains("json")
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
