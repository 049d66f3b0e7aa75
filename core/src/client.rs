//! Blocking HTTP client bound to one base URL.
//!
//! # Design
//! `ApiClient` holds an immutable `ClientConfig` and a `Transport`. Each verb
//! method returns a `RequestBuilder`; `build` turns it into a fully resolved
//! `HttpRequest` without I/O and `send` hands that request to the transport.
//! Per-call headers are merged into a fresh list, so the configured defaults
//! are never touched.
//!
//! 4xx and 5xx responses are `Ok`. Only transport failures are `Err`.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A logical request: path relative to the base URL plus per-call extras.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub payload: Option<Payload>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            payload: None,
            headers: Vec::new(),
            timeout: None,
        }
    }
}

/// Synchronous client for a JSON REST API.
#[derive(Debug, Clone)]
pub struct ApiClient<T = UreqTransport> {
    config: ClientConfig,
    identity_headers: Vec<(String, String)>,
    transport: T,
}

impl ApiClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Client for `base_url` with default timeout and no credentials.
    pub fn from_base_url(base_url: &str) -> Self {
        Self::new(ClientConfig::new(base_url))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let identity_headers = config.identity_headers();
        Self {
            config,
            identity_headers,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// Full URL for `path`. See [`resolve_url`].
    pub fn resolve(&self, path: &str) -> String {
        resolve_url(self.config.base_url(), path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder<'_, T> {
        self.request(HttpMethod::Get, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder<'_, T> {
        self.request(HttpMethod::Post, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder<'_, T> {
        self.request(HttpMethod::Put, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder<'_, T> {
        self.request(HttpMethod::Delete, path)
    }

    pub fn request(&self, method: HttpMethod, path: &str) -> RequestBuilder<'_, T> {
        RequestBuilder {
            client: self,
            request: Request::new(method, path),
            error: None,
        }
    }

    /// Resolve a logical request without sending it.
    pub fn prepare(&self, request: &Request) -> Result<HttpRequest, ApiError> {
        let mut url = self.resolve(&request.path);
        if !request.query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&encode_pairs(&request.query));
        }

        if request.payload.is_some() && matches!(request.method, HttpMethod::Get | HttpMethod::Delete) {
            return Err(ApiError::InvalidRequest(format!(
                "{} {} cannot carry a body",
                request.method, request.path
            )));
        }

        let (content_type, body) = match &request.payload {
            None => (None, None),
            Some(Payload::Json(value)) => {
                let body = serde_json::to_string(value).map_err(|e| ApiError::SerializationError(e.to_string()))?;
                (Some(JSON_CONTENT_TYPE), Some(body))
            }
            Some(Payload::Form(fields)) => (Some(FORM_CONTENT_TYPE), Some(encode_pairs(fields))),
        };

        let mut headers = self.identity_headers.clone();
        if let Some(ct) = content_type {
            headers = merge_headers(&headers, &[("Content-Type".to_string(), ct.to_string())]);
        }
        let headers = merge_headers(&headers, &request.headers);

        Ok(HttpRequest {
            method: request.method,
            url,
            headers,
            body,
            timeout: request.timeout.unwrap_or(self.config.timeout()),
        })
    }

    /// Resolve and send a logical request.
    pub fn execute(&self, request: &Request) -> Result<HttpResponse, ApiError> {
        let http_request = self.prepare(request)?;
        let response = self.transport.execute(&http_request)?;
        debug!(
            method = %http_request.method,
            path = %request.path,
            status = response.status(),
            "request completed"
        );
        Ok(response)
    }
}

/// Builder returned by the verb methods of [`ApiClient`].
#[must_use]
pub struct RequestBuilder<'a, T> {
    client: &'a ApiClient<T>,
    request: Request,
    error: Option<ApiError>,
}

impl<'a, T: Transport> RequestBuilder<'a, T> {
    /// Appends a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.request.query.push((name.into(), value.to_string()));
        self
    }

    pub fn query_pairs<K, V, I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.request
            .query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets a header for this call only. Overrides a default of the same
    /// name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.request.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.request.headers.push((name, value.into()));
        self
    }

    /// Sends `body` as JSON.
    pub fn json<S: Serialize + ?Sized>(mut self, body: &S) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.request.payload = Some(Payload::Json(value)),
            Err(e) => self.error = Some(ApiError::SerializationError(e.to_string())),
        }
        self
    }

    /// Sends `fields` as an urlencoded form.
    pub fn form<K, V, I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.request.payload = Some(Payload::Form(fields));
        self
    }

    /// Overrides the configured timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    pub fn into_request(self) -> Result<Request, ApiError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.request),
        }
    }

    /// Resolve without sending.
    pub fn build(self) -> Result<HttpRequest, ApiError> {
        let client = self.client;
        let request = self.into_request()?;
        client.prepare(&request)
    }

    pub fn send(self) -> Result<HttpResponse, ApiError> {
        let client = self.client;
        let request = self.into_request()?;
        client.execute(&request)
    }
}

/// Join `base_url` and `path` with exactly one slash.
///
/// A `path` that already carries a scheme (`https://...`) is returned
/// unchanged. Otherwise all trailing slashes of `base_url` and all leading
/// slashes of `path` are dropped before joining.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if has_scheme(path) {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// `scheme "://"` where scheme is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
fn has_scheme(path: &str) -> bool {
    let Some((scheme, _)) = path.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Overlay `overrides` on `defaults`. Names compare case-insensitively and an
/// override replaces the default in place.
pub fn merge_headers(defaults: &[(String, String)], overrides: &[(String, String)]) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults.to_vec();
    for (name, value) in overrides {
        match merged.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(slot) => *slot = (name.clone(), value.clone()),
            None => merged.push((name.clone(), value.clone())),
        }
    }
    merged
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    /// Records every request and answers with a canned response.
    struct Recorder {
        seen: RefCell<Vec<HttpRequest>>,
        status: u16,
        body: &'static str,
    }

    impl Recorder {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                status,
                body,
            }
        }

        fn last(&self) -> HttpRequest {
            self.seen.borrow().last().cloned().unwrap()
        }
    }

    impl Transport for Recorder {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request.clone());
            Ok(HttpResponse::new(
                self.status,
                vec![("content-type".to_string(), "application/json".to_string())],
                self.body,
            ))
        }
    }

    fn client() -> ApiClient<Recorder> {
        ApiClient::with_transport(ClientConfig::new("https://reqres.in/api/"), Recorder::new(200, "{}"))
    }

    #[test]
    fn resolve_joins_with_one_slash() {
        let c = client();
        assert_eq!(c.resolve("/users/2"), "https://reqres.in/api/users/2");
        assert_eq!(c.resolve("users/2"), "https://reqres.in/api/users/2");
        assert_eq!(c.resolve("///users"), "https://reqres.in/api/users");
    }

    #[test]
    fn resolve_keeps_absolute_urls() {
        let c = client();
        assert_eq!(c.resolve("http://example.com/x"), "http://example.com/x");
        assert_eq!(c.resolve("https://example.com//y"), "https://example.com//y");
    }

    #[test]
    fn resolve_is_idempotent_under_renormalisation() {
        for base in ["http://h/api", "http://h/api/", "http://h/api///"] {
            for path in ["users", "/users", "////users"] {
                let once = resolve_url(base, path);
                assert_eq!(once, "http://h/api/users");
                // Re-normalising the base or re-resolving the result is a no-op.
                assert_eq!(resolve_url(&resolve_url(base, ""), path), once);
                assert_eq!(resolve_url(base, &once), once);
            }
        }
    }

    #[test]
    fn scheme_detection() {
        assert!(has_scheme("https://a"));
        assert!(has_scheme("svn+ssh://a"));
        assert!(!has_scheme("/users?next=http://x"));
        assert!(!has_scheme("httpbin/users"));
        assert!(!has_scheme("://a"));
    }

    #[test]
    fn default_headers_and_credentials_are_sent() {
        let config = ClientConfig::new("http://h").with_api_key("reqres-free-v1").with_bearer_token("t0k");
        let c = ApiClient::with_transport(config, Recorder::new(200, "{}"));
        let req = c.get("/users").build().unwrap();
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("x-api-key"), Some("reqres-free-v1"));
        assert_eq!(req.header("authorization"), Some("Bearer t0k"));
        assert!(req.body.is_none());
    }

    #[test]
    fn call_headers_win_without_touching_defaults() {
        let c = client();
        let req = c.get("/users").header("ACCEPT", "text/html").build().unwrap();
        assert_eq!(req.header("accept"), Some("text/html"));
        assert_eq!(req.headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case("accept")).count(), 1);

        let again = c.get("/users").build().unwrap();
        assert_eq!(again.header("accept"), Some("application/json"));
        assert_eq!(
            c.config().default_headers(),
            &[("Accept".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn query_is_encoded_into_url() {
        let req = client()
            .get("/users")
            .query("page", 2)
            .query("q", "a b&c")
            .build()
            .unwrap();
        assert_eq!(req.url, "https://reqres.in/api/users?page=2&q=a%20b%26c");
    }

    #[test]
    fn query_appends_to_existing_query_string() {
        let req = client().get("/users?page=2").query("per_page", 3).build().unwrap();
        assert_eq!(req.url, "https://reqres.in/api/users?page=2&per_page=3");
    }

    #[test]
    fn json_body_sets_content_type() {
        let req = client()
            .post("/login")
            .json(&json!({"email": "eve.holt@reqres.in", "password": "cityslicka"}))
            .build()
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "eve.holt@reqres.in");
    }

    #[test]
    fn form_body_is_urlencoded() {
        let req = client()
            .post("/users")
            .form([("name", "Kiran K"), ("job", "Staff Engineer")])
            .build()
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(req.body.as_deref(), Some("name=Kiran%20K&job=Staff%20Engineer"));
    }

    #[test]
    fn explicit_content_type_wins_over_payload_default() {
        let req = client()
            .put("/users/2")
            .header("Content-Type", "application/merge-patch+json")
            .json(&json!({"job": "zion resident"}))
            .build()
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/merge-patch+json"));
    }

    #[test]
    fn timeout_defaults_and_overrides() {
        let c = client();
        assert_eq!(c.get("/users").build().unwrap().timeout, Duration::from_secs(10));
        let req = c.get("/users").timeout(Duration::from_millis(250)).build().unwrap();
        assert_eq!(req.timeout, Duration::from_millis(250));
    }

    #[test]
    fn error_statuses_are_responses() {
        let c = ApiClient::with_transport(
            ClientConfig::new("http://h"),
            Recorder::new(400, r#"{"error":"Missing password"}"#),
        );
        let resp = c.post("/login").json(&json!({"email": "peter@klaven"})).send().unwrap();
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.parsed_body().unwrap()["error"], "Missing password");
    }

    #[test]
    fn send_passes_resolved_request_to_transport() {
        let c = client();
        c.delete("/users/2").send().unwrap();
        let seen = c.transport.last();
        assert_eq!(seen.method, HttpMethod::Delete);
        assert_eq!(seen.url, "https://reqres.in/api/users/2");
    }

    #[test]
    fn serialization_failure_is_reported_on_send() {
        use std::collections::HashMap;
        // Non-string map keys cannot become JSON object keys.
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], "x");
        let c = client();
        let err = c.post("/users").json(&bad).send().unwrap_err();
        assert!(matches!(err, ApiError::SerializationError(_)));
        assert!(c.transport.seen.borrow().is_empty());
    }

    #[test]
    fn body_on_get_or_delete_is_rejected() {
        let c = client();
        let err = c.delete("/users/2").json(&json!({"a": 1})).send().unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)), "{err:?}");
        let err = c.get("/users").form([("page", "2")]).build().unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)), "{err:?}");
        assert!(c.transport.seen.borrow().is_empty());
    }

    #[test]
    fn merge_headers_replaces_in_place() {
        let defaults = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("x-api-key".to_string(), "a".to_string()),
        ];
        let merged = merge_headers(&defaults, &[("X-API-KEY".to_string(), "b".to_string())]);
        assert_eq!(
            merged,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-API-KEY".to_string(), "b".to_string()),
            ]
        );
    }
}
