//! Client configuration.
//!
//! # Design
//! A `ClientConfig` carries everything that stays fixed for the lifetime of
//! an `ApiClient`: base URL, default headers, credentials and the default
//! timeout. It can be built in code or read from `REQRES_*` environment
//! variables. Environment loading goes through a lookup function so it can
//! be tested without touching the process environment.

use std::time::Duration;

use crate::error::ApiError;

/// Public ReqRes endpoint.
pub const DEFAULT_BASE_URL: &str = "https://reqres.in/api";

/// Default per-request timeout (10 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Header that carries an API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// A credential presented on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent as `Authorization: Bearer <token>`.
    BearerToken(String),
    /// Sent as `x-api-key: <key>`.
    ApiKey(String),
}

impl Credential {
    pub fn header(&self) -> (String, String) {
        match self {
            Credential::BearerToken(token) => ("Authorization".to_string(), format!("Bearer {token}")),
            Credential::ApiKey(key) => (API_KEY_HEADER.to_string(), key.clone()),
        }
    }
}

/// Static identity and defaults for one `ApiClient`.
///
/// Built once and never changed by the client. The `with_*` methods consume
/// the config and return an updated copy, so there is no way to alter a
/// config a client already holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    base_url: String,
    default_headers: Vec<(String, String)>,
    timeout: Duration,
    bearer_token: Option<String>,
    api_key: Option<String>,
}

impl ClientConfig {
    /// Trailing slashes on `base_url` are stripped.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: vec![("Accept".to_string(), "application/json".to_string())],
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bearer_token: None,
            api_key: None,
        }
    }

    /// Load configuration from the process environment.
    ///
    /// - `REQRES_BASE_URL` (optional, default `https://reqres.in/api`)
    /// - `REQRES_API_KEY` (optional)
    /// - `REQRES_BEARER_TOKEN` (optional)
    /// - `REQRES_TIMEOUT_SECS` (optional, default 10) — positive integer
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("REQRES_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut config = Self::new(&base_url);

        if let Some(raw) = lookup("REQRES_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| {
                    ApiError::InvalidConfig("REQRES_TIMEOUT_SECS must be a positive integer".to_string())
                })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(key) = lookup("REQRES_API_KEY").filter(|v| !v.is_empty()) {
            config = config.with_api_key(key);
        }
        if let Some(token) = lookup("REQRES_BEARER_TOKEN").filter(|v| !v.is_empty()) {
            config = config.with_bearer_token(token);
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_credential(self, credential: Credential) -> Self {
        match credential {
            Credential::BearerToken(token) => self.with_bearer_token(token),
            Credential::ApiKey(key) => self.with_api_key(key),
        }
    }

    /// Adds a header sent on every request, replacing any existing default
    /// with the same (case-insensitive) name.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.default_headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.default_headers.push((name, value.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    pub fn credentials(&self) -> Vec<Credential> {
        let mut out = Vec::new();
        if let Some(token) = &self.bearer_token {
            out.push(Credential::BearerToken(token.clone()));
        }
        if let Some(key) = &self.api_key {
            out.push(Credential::ApiKey(key.clone()));
        }
        out
    }

    /// Default headers followed by credential headers. Credential headers win
    /// over a default of the same name.
    pub fn identity_headers(&self) -> Vec<(String, String)> {
        let credential_headers: Vec<(String, String)> =
            self.credentials().iter().map(Credential::header).collect();
        crate::client::merge_headers(&self.default_headers, &credential_headers)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
