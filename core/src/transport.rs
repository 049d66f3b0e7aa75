//! Executes resolved `HttpRequest`s.
//!
//! `ApiClient` never performs I/O itself; it hands an `HttpRequest` to a
//! `Transport`. The default `UreqTransport` owns one `ureq::Agent`, so
//! sequential requests from the same client reuse pooled connections.

use std::io;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs the network round-trip for a resolved request.
///
/// Implementations must return HTTP error statuses as `Ok` responses and
/// reserve `Err` for failures of the exchange itself.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by ureq.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        // Status codes are data for the caller, never errors.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let started = Instant::now();

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_parts(self.agent.get(&request.url), request).call(),
            (HttpMethod::Delete, _) => with_parts(self.agent.delete(&request.url), request).call(),
            (HttpMethod::Post, Some(body)) => {
                with_parts(self.agent.post(&request.url), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_parts(self.agent.post(&request.url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_parts(self.agent.put(&request.url), request).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_parts(self.agent.put(&request.url), request).send_empty(),
        };

        let mut response = result.map_err(|e| transport_error(request, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| transport_error(request, e))?;

        debug!(
            method = %request.method,
            url = %request.url,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "received response"
        );
        Ok(HttpResponse::new(status, headers, body))
    }
}

/// Apply headers and the per-request timeout to a ureq builder.
fn with_parts<B>(builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    let mut builder = builder;
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .config()
        .timeout_global(Some(request.timeout))
        .build()
}

fn transport_error(request: &HttpRequest, error: ureq::Error) -> ApiError {
    let timed_out = match &error {
        ureq::Error::Timeout(_) => true,
        ureq::Error::Io(e) => e.kind() == io::ErrorKind::TimedOut,
        _ => false,
    };
    warn!(method = %request.method, url = %request.url, error = %error, "request failed");
    if timed_out {
        ApiError::Timeout {
            method: request.method,
            url: request.url.clone(),
            timeout: request.timeout,
        }
    } else {
        ApiError::Transport {
            method: request.method,
            url: request.url.clone(),
            message: error.to_string(),
        }
    }
}
