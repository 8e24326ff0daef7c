use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// The only bearer token the server accepts.
pub const VALID_TOKEN: &str = "test-token";

/// Link ids that trigger a fixed failure shape instead of a lookup.
pub const PLAIN_ERROR_ID: &str = "plain-error";
pub const EMPTY_ERROR_ID: &str = "empty-error";
pub const BAD_JSON_ID: &str = "bad-json";
pub const SLOW_ID: &str = "slow";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    pub id: u64,
    pub alias: String,
    pub url: String,
    pub short_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub clicks: u64,
    pub disabled: u8,
    pub public: u8,
    pub password_protected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_clicks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_url: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct Envelope {
    pub data: Link,
    pub status: u16,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

/// A request as the server saw it.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
pub struct AppState {
    links: RwLock<HashMap<String, Link>>,
    next_id: AtomicU64,
    requests: RwLock<Vec<RecordedRequest>>,
}

impl AppState {
    pub async fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    async fn record(
        &self,
        method: Method,
        path: String,
        headers: &HeaderMap,
        form: Vec<(String, String)>,
    ) {
        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        self.requests.write().await.push(RecordedRequest {
            method: method.to_string(),
            path,
            headers,
            form,
        });
    }
}

pub type SharedState = Arc<AppState>;

pub fn app() -> Router {
    app_with_state(SharedState::default())
}

pub fn app_with_state(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/links", post(create_link))
        .route("/api/v1/links/{id}", get(get_link))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, SharedState::default()).await
}

pub async fn run_with_state(
    listener: TcpListener,
    state: SharedState,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn error_response(status: StatusCode, error: &str, message: &str) -> Response {
    (status, Json(ErrorBody { error, message })).into_response()
}

fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == VALID_TOKEN)
}

fn field(form: &HashMap<String, String>, key: &str) -> Option<String> {
    form.get(key).filter(|value| !value.is_empty()).cloned()
}

fn number(form: &HashMap<String, String>, key: &str) -> Result<Option<u64>, Response> {
    match form.get(key) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request",
                &format!("{key} must be a number"),
            )
        }),
    }
}

async fn create_link(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut recorded_form: Vec<(String, String)> = form.clone().into_iter().collect();
    recorded_form.sort();
    state
        .record(Method::POST, "/api/v1/links".to_string(), &headers, recorded_form)
        .await;

    if !is_authorized(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized", "invalid token");
    }
    let Some(url) = field(&form, "url") else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_request",
            "the url field is required",
        );
    };
    let expiration_clicks = match number(&form, "expiration_clicks") {
        Ok(value) => value,
        Err(response) => return response,
    };

    let alias = field(&form, "alias")
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string()[..8].to_string());
    let mut links = state.links.write().await;
    if links.contains_key(&alias) {
        return (StatusCode::CONFLICT, "alias already taken").into_response();
    }

    let link = Link {
        id: state.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        short_url: format!("https://zaya.io/{alias}"),
        alias: alias.clone(),
        url,
        description: field(&form, "description"),
        clicks: 0,
        disabled: u8::from(form.get("disable").is_some_and(|v| v == "1")),
        public: u8::from(form.get("public").is_some_and(|v| v == "1")),
        password_protected: field(&form, "password").is_some(),
        expiration_date: field(&form, "expiration_date"),
        expiration_time: field(&form, "expiration_time"),
        expiration_clicks,
        expiration_url: field(&form, "expiration_url"),
    };
    links.insert(alias, link.clone());
    tracing::debug!(id = link.id, alias = %link.alias, "link created");

    (
        StatusCode::CREATED,
        Json(Envelope {
            data: link,
            status: StatusCode::CREATED.as_u16(),
        }),
    )
        .into_response()
}

async fn get_link(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state
        .record(Method::GET, format!("/api/v1/links/{id}"), &headers, Vec::new())
        .await;

    if !is_authorized(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized", "invalid token");
    }

    match id.as_str() {
        PLAIN_ERROR_ID => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response()
        }
        EMPTY_ERROR_ID => return StatusCode::SERVICE_UNAVAILABLE.into_response(),
        BAD_JSON_ID => {
            return (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                "{not json",
            )
                .into_response()
        }
        SLOW_ID => tokio::time::sleep(Duration::from_secs(5)).await,
        _ => {}
    }

    let links = state.links.read().await;
    let found = links
        .get(&id)
        .or_else(|| links.values().find(|link| link.id.to_string() == id));
    match found {
        Some(link) => Json(Envelope {
            data: link.clone(),
            status: StatusCode::OK.as_u16(),
        })
        .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "not_found", "link not found"),
    }
}
