use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{FromRequest, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

pub const TOKEN: &str = "QpwL5tke4Pnpja7X4";
pub const PER_PAGE: u32 = 6;

const SUPPORT_URL: &str = "https://contentcaddy.io?utm_source=reqres&utm_medium=json&utm_campaign=referral";
const SUPPORT_TEXT: &str = "Tired of writing endless social media content? Let Content Caddy generate it for you.";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

#[derive(Deserialize, Default)]
pub struct Login {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub delay: Option<u64>,
}

#[derive(Clone)]
pub struct AppState {
    users: Arc<Vec<User>>,
    next_id: Arc<AtomicU64>,
    api_key: Option<String>,
}

const NAMES: [(&str, &str); 12] = [
    ("George", "Bluth"),
    ("Janet", "Weaver"),
    ("Emma", "Wong"),
    ("Eve", "Holt"),
    ("Charles", "Morris"),
    ("Tracey", "Ramos"),
    ("Michael", "Lawson"),
    ("Lindsay", "Ferguson"),
    ("Tobias", "Funke"),
    ("Byron", "Fields"),
    ("George", "Edwards"),
    ("Rachel", "Howell"),
];

/// The fixed ReqRes user directory.
pub fn users() -> Vec<User> {
    NAMES
        .iter()
        .zip(1u32..)
        .map(|((first, last), id)| User {
            id,
            email: format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
            first_name: first.to_string(),
            last_name: last.to_string(),
            avatar: format!("https://reqres.in/img/faces/{id}-image.jpg"),
        })
        .collect()
}

/// Router without an API-key requirement.
pub fn app() -> Router {
    build(None)
}

/// Router that answers 401 unless `x-api-key` equals `key`.
pub fn app_with_api_key(key: impl Into<String>) -> Router {
    build(Some(key.into()))
}

fn build(api_key: Option<String>) -> Router {
    let state = AppState {
        users: Arc::new(users()),
        next_id: Arc::new(AtomicU64::new(100)),
        api_key,
    };
    let api = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/login", post(login))
        .route("/register", post(register))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state);
    Router::new().nest("/api", api).fallback(not_found)
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(expected) = &state.api_key {
        let presented = request.headers().get("x-api-key").and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            tracing::debug!(path = %request.uri().path(), "rejecting request without api key");
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Missing API key"}))).into_response();
        }
    }
    next.run(request).await
}

fn support() -> Value {
    json!({"url": SUPPORT_URL, "text": SUPPORT_TEXT})
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

async fn list_users(State(state): State<AppState>, Query(params): Query<ListParams>) -> Json<Value> {
    if let Some(secs) = params.delay {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(PER_PAGE).max(1);
    let total = state.users.len() as u32;
    let data: Vec<&User> = state
        .users
        .iter()
        .skip((page - 1).saturating_mul(per_page) as usize)
        .take(per_page as usize)
        .collect();
    Json(json!({
        "page": page,
        "per_page": per_page,
        "total": total,
        "total_pages": total.div_ceil(per_page),
        "data": data,
        "support": support(),
    }))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    let user = id
        .parse::<u32>()
        .ok()
        .and_then(|id| state.users.iter().find(|u| u.id == id));
    match user {
        Some(user) => (StatusCode::OK, Json(json!({"data": user, "support": support()}))),
        None => (StatusCode::NOT_FOUND, Json(json!({}))),
    }
}

/// Accepts JSON or an urlencoded form, like ReqRes does.
async fn create_user(State(state): State<AppState>, request: Request) -> Response {
    let mut fields = match read_fields(request).await {
        Ok(fields) => fields,
        Err(rejection) => return rejection,
    };
    let id = state.next_id.fetch_add(1, Ordering::Relaxed);
    fields.insert("id".to_string(), Value::String(id.to_string()));
    fields.insert("createdAt".to_string(), Value::String(now()));
    (StatusCode::CREATED, Json(Value::Object(fields))).into_response()
}

async fn update_user(Path(_id): Path<String>, request: Request) -> Response {
    let mut fields = match read_fields(request).await {
        Ok(fields) => fields,
        Err(rejection) => return rejection,
    };
    fields.insert("updatedAt".to_string(), Value::String(now()));
    (StatusCode::OK, Json(Value::Object(fields))).into_response()
}

async fn delete_user(Path(_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn login(State(state): State<AppState>, request: Request) -> (StatusCode, Json<Value>) {
    let input = match read_login(request).await {
        Ok(input) => input,
        Err(status) => return (status, Json(json!({"error": "Invalid request body"}))),
    };
    let Some(email) = input.email.or(input.username) else {
        return bad_request("Missing email or username");
    };
    if input.password.is_none() {
        return bad_request("Missing password");
    }
    if !state.users.iter().any(|u| u.email == email) {
        return bad_request("user not found");
    }
    (StatusCode::OK, Json(json!({"token": TOKEN})))
}

async fn register(State(state): State<AppState>, request: Request) -> (StatusCode, Json<Value>) {
    let input = match read_login(request).await {
        Ok(input) => input,
        Err(status) => return (status, Json(json!({"error": "Invalid request body"}))),
    };
    let Some(email) = input.email.or(input.username) else {
        return bad_request("Missing email or username");
    };
    if input.password.is_none() {
        return bad_request("Missing password");
    }
    match state.users.iter().find(|u| u.email == email) {
        Some(user) => (StatusCode::OK, Json(json!({"id": user.id, "token": TOKEN}))),
        None => bad_request("Note: Only defined users succeed registration"),
    }
}

async fn not_found() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::NOT_FOUND,
        Html("<!DOCTYPE html><html><head><title>Not Found</title></head><body>Not Found</body></html>"),
    )
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

async fn read_fields(request: Request) -> Result<Map<String, Value>, Response> {
    if is_form(&request) {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(fields.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
    } else {
        let Json(fields) = Json::<Map<String, Value>>::from_request(request, &())
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(fields)
    }
}

async fn read_login(request: Request) -> Result<Login, StatusCode> {
    if is_form(&request) {
        Form::<Login>::from_request(request, &())
            .await
            .map(|Form(login)| login)
            .map_err(|_| StatusCode::BAD_REQUEST)
    } else {
        Json::<Login>::from_request(request, &())
            .await
            .map(|Json(login)| login)
            .map_err(|_| StatusCode::BAD_REQUEST)
    }
}
