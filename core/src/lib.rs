//! Blocking client and contract validator for the ReqRes REST API.
//!
//! # Overview
//! `ApiClient` resolves paths against a base URL, attaches default headers and
//! credentials, and returns every HTTP response as data, whatever its status.
//! `schema::validate` checks a parsed body against a JSON Schema and reports
//! each violation by name. `ReqresApi` layers typed endpoint methods on top.
//!
//! # Design
//! - `ClientConfig` is immutable once a client holds it; per-call headers are
//!   merged into a fresh list.
//! - Requests are resolved into plain `HttpRequest` data before a `Transport`
//!   performs I/O, so request shaping is testable without a network.
//! - Response bodies are parsed opportunistically: `parsed_body()` is `None`
//!   for non-JSON bodies instead of an error.
//! - Only transport failures (`ApiError::Timeout`, `ApiError::Transport`) are
//!   errors at the client level. Nothing is retried.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod reqres;
pub mod schema;
pub mod transport;
pub mod types;

pub use client::{merge_headers, resolve_url, ApiClient, Payload, Request, RequestBuilder};
pub use config::{ClientConfig, Credential, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{is_json_content_type, is_json_response, Body, HttpMethod, HttpRequest, HttpResponse};
pub use reqres::ReqresApi;
pub use schema::{validate, SchemaError, SchemaValidator};
pub use transport::{Transport, UreqTransport};
pub use types::{
    CreatedUser, Credentials, ErrorBody, NewUser, Registration, SingleUser, Support, Token, UpdatedUser, User,
    UserPage,
};
