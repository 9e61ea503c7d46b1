//! Purpose: Provide the HTTP/JSON workout service.
//! Exports: `ServeConfig`, `serve`, `validate_config`.
//! Role: Axum server owning the authoritative collection in a `WorkoutStore`.
//! Invariants: Every create/update payload is validated here, independent of clients.
//! Invariants: Error bodies are `{ "error": <message>, "kind": <ErrorKind> }`.
//! Invariants: Loopback-only unless explicitly allowed.
//! Notes: Requests are serialized on the store mutex; writes hit disk before responding.

use axum::extract::rejection::{BytesRejection, PathRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path as AxumPath, Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use liftlog::api::{
    DEFAULT_LIMIT, DEFAULT_PAGE, Error, ErrorKind, PageRequest, WorkoutDraft, WorkoutStore,
    validate_workout,
};

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_MAX_LIMIT: u64 = 100;
pub const DEFAULT_MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub store_path: PathBuf,
    pub cors_origins: Vec<String>,
    pub allow_non_loopback: bool,
    pub max_limit: u64,
    pub max_body_bytes: u64,
}

struct AppState {
    store: Mutex<WorkoutStore>,
    max_limit: u64,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let max_body_bytes: usize = config
        .max_body_bytes
        .try_into()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("--max-body-bytes is too large"))?;
    let cors = cors_layer(&config.cors_origins)?;

    let store = WorkoutStore::open(&config.store_path)?;
    info!(
        store = %store.path().display(),
        records = store.records().len(),
        seeded = store.was_seeded(),
        "opened workout store"
    );

    let state = Arc::new(AppState {
        store: Mutex::new(store),
        max_limit: config.max_limit,
    });

    let mut app = router(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http());
    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;
    info!(bind = %config.bind, "workout service listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    info!("workout service stopped");
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/workouts", get(list_workouts).post(create_workout))
        .route(
            "/api/workouts/:id",
            put(update_workout).delete(delete_workout),
        )
        .route("/api/stats", get(stats))
        .with_state(state)
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

pub fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }

    if config.max_limit == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-limit must be greater than zero")
            .with_hint("Use a positive value like 100."));
    }

    if config.max_body_bytes == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes must be greater than zero")
            .with_hint("Use a positive value like 65536."));
    }

    if config.max_body_bytes > usize::MAX as u64 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes exceeds platform limits")
            .with_hint("Use a smaller value that fits in memory."));
    }

    Ok(())
}

fn cors_layer(origins: &[String]) -> Result<Option<CorsLayer>, Error> {
    if origins.is_empty() {
        return Ok(None);
    }
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let mut values = Vec::with_capacity(origins.len());
        for origin in origins {
            let value = HeaderValue::from_str(origin).map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("invalid --cors-origin value: {origin}"))
                    .with_source(err)
            })?;
            values.push(value);
        }
        AllowOrigin::list(values)
    };
    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
    ))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
}

async fn healthz() -> Response {
    Json(json!({ "ok": true })).into_response()
}

async fn list_workouts(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    let request = match page_request(&query, state.max_limit) {
        Ok(request) => request,
        Err(err) => return error_response(err),
    };
    match with_store(&state, |store| Ok(store.list(request))) {
        Ok(page) => Json(page).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_workout(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    let draft = match draft_from_body(&body) {
        Ok(draft) => draft,
        Err(err) => return error_response(err),
    };
    match with_store(&state, |store| store.create(draft)) {
        Ok(record) => {
            info!(id = record.id, "created workout");
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn update_workout(
    State(state): State<Arc<AppState>>,
    id: Result<AxumPath<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let id = match id {
        Ok(AxumPath(id)) => id,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return error_response(err),
    };
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    let draft = match draft_from_body(&body) {
        Ok(draft) => draft,
        Err(err) => return error_response(err),
    };
    match with_store(&state, |store| store.update(id, draft)) {
        Ok(record) => {
            info!(id, "updated workout");
            Json(record).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn delete_workout(
    State(state): State<Arc<AppState>>,
    id: Result<AxumPath<String>, PathRejection>,
) -> Response {
    let id = match id {
        Ok(AxumPath(id)) => id,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return error_response(err),
    };
    match with_store(&state, |store| store.delete(id)) {
        Ok(()) => {
            info!(id, "deleted workout");
            Json(json!({ "ok": true })).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn stats(State(state): State<Arc<AppState>>) -> Response {
    match with_store(&state, |store| Ok(store.stats())) {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => error_response(err),
    }
}

fn with_store<T>(
    state: &AppState,
    op: impl FnOnce(&mut WorkoutStore) -> Result<T, Error>,
) -> Result<T, Error> {
    let mut store = state
        .store
        .lock()
        .map_err(|_| Error::new(ErrorKind::Internal).with_message("workout store lock poisoned"))?;
    op(&mut store)
}

fn page_request(query: &ListQuery, max_limit: u64) -> Result<PageRequest, Error> {
    let page = parse_query_number(query.page.as_deref(), "page", DEFAULT_PAGE)?;
    let limit = parse_query_number(query.limit.as_deref(), "limit", DEFAULT_LIMIT)?;
    if limit > max_limit {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("limit must be at most {max_limit}")));
    }
    PageRequest::new(page, limit)
}

fn parse_query_number(value: Option<&str>, name: &str, default: u64) -> Result<u64, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(text) => text.parse::<u64>().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message(format!("{name} must be a positive integer"))
        }),
    }
}

fn parse_id(raw: &str) -> Result<u64, Error> {
    raw.parse::<u64>()
        .map_err(|_| Error::new(ErrorKind::NotFound).with_message("not found"))
}

fn draft_from_body(body: &[u8]) -> Result<WorkoutDraft, Error> {
    let value: Value = serde_json::from_slice(body).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("request body must be valid JSON")
            .with_source(err)
    })?;
    let draft = WorkoutDraft::from_json(&value)?;
    validate_workout(&draft)?;
    Ok(draft)
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Usage | ErrorKind::Invalid => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Permission => StatusCode::FORBIDDEN,
        ErrorKind::Busy => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Corrupt | ErrorKind::Io | ErrorKind::Internal | ErrorKind::Network => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: Error) -> Response {
    error_response_with_status(status_for(err.kind()), err)
}

/// Extractor rejections (oversized body, malformed query) keep axum's status
/// but use the same JSON error body as every other failure.
fn rejection_response(status: StatusCode, message: String) -> Response {
    error_response_with_status(status, Error::new(ErrorKind::Usage).with_message(message))
}

fn error_response_with_status(status: StatusCode, err: Error) -> Response {
    let message = err.message().unwrap_or("error").to_string();
    if status.is_server_error() {
        warn!(kind = err.kind().as_str(), error = %err, "request failed");
    } else {
        warn!(kind = err.kind().as_str(), message = %message, "request rejected");
    }
    let body = json!({
        "error": message,
        "kind": err.kind().as_str(),
    });
    (status, Json(body)).into_response()
}
