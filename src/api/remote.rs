//! Purpose: Provide an HTTP client for the workout service's JSON API.
//! Exports: `RemoteClient`.
//! Role: Server-backed persistence adapter; every call is one network round-trip.
//! Invariants: No local copy is kept; callers re-fetch to observe their own writes.
//! Invariants: Transport failures surface as `ErrorKind::Network`, never panics.
//! Invariants: Error bodies are `{ "error": <message>, "kind"?: <ErrorKind> }`.
#![allow(clippy::result_large_err)]

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::backend::{ApiResult, DEFAULT_TIMEOUT};
use crate::core::error::{Error, ErrorKind};
use crate::core::paging::{Page, PageRequest};
use crate::core::record::{WorkoutDraft, WorkoutRecord};
use crate::core::stats::Stats;

#[derive(Clone)]
pub struct RemoteClient {
    inner: Arc<RemoteClientInner>,
}

struct RemoteClientInner {
    base_url: Url,
    timeout: Duration,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
    kind: Option<String>,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            inner: Arc::new(RemoteClientInner {
                base_url,
                timeout: DEFAULT_TIMEOUT,
                agent: build_agent(DEFAULT_TIMEOUT),
            }),
        })
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RemoteClientInner {
                base_url: self.inner.base_url.clone(),
                timeout,
                agent: build_agent(timeout),
            }),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn list(&self, request: PageRequest) -> ApiResult<Page> {
        let mut url = build_url(&self.inner.base_url, &["api", "workouts"])?;
        url.query_pairs_mut()
            .append_pair("page", &request.page.to_string())
            .append_pair("limit", &request.limit.to_string());
        self.request_json::<(), _>("GET", &url, None)
    }

    pub fn create(&self, draft: &WorkoutDraft) -> ApiResult<WorkoutRecord> {
        let url = build_url(&self.inner.base_url, &["api", "workouts"])?;
        self.request_json("POST", &url, Some(draft))
    }

    pub fn update(&self, id: u64, draft: &WorkoutDraft) -> ApiResult<WorkoutRecord> {
        let id_segment = id.to_string();
        let url = build_url(&self.inner.base_url, &["api", "workouts", &id_segment])?;
        self.request_json("PUT", &url, Some(draft))
            .map_err(|err| with_missing_id(err, id))
    }

    pub fn delete(&self, id: u64) -> ApiResult<()> {
        let id_segment = id.to_string();
        let url = build_url(&self.inner.base_url, &["api", "workouts", &id_segment])?;
        let _value: serde_json::Value = self
            .request_json::<(), _>("DELETE", &url, None)
            .map_err(|err| with_missing_id(err, id))?;
        Ok(())
    }

    pub fn stats(&self) -> ApiResult<Stats> {
        let url = build_url(&self.inner.base_url, &["api", "stats"])?;
        self.request_json::<(), _>("GET", &url, None)
    }

    fn request_json<T, R>(&self, method: &str, url: &Url, body: Option<&T>) -> ApiResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        debug!(method, url = %url, "remote request");
        let request = self
            .inner
            .agent
            .request(method, url.as_str())
            .set("Accept", "application/json");
        let response = match body {
            None => request.call(),
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode request json")
                        .with_source(err)
                })?;
                request
                    .set("Content-Type", "application/json")
                    .send_string(&payload)
            }
        };

        match response {
            Ok(resp) => read_json_response(resp),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Network)
                .with_message("could not reach backend")
                .with_hint(format!("Check that the service at {} is running.", self.inner.base_url))
                .with_source(err)),
        }
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

fn with_missing_id(err: Error, id: u64) -> Error {
    if err.kind() == ErrorKind::NotFound {
        err.with_id(id)
    } else {
        err
    }
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid remote base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("remote base url must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(
            Error::new(ErrorKind::Usage).with_message("remote base url must not include a path")
        );
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("remote base url cannot be a base")
        })?;
        path.clear();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_json_response<R>(response: ureq::Response) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Network)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    let fallback = error_kind_from_status(status);
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => {
            let kind = envelope
                .kind
                .as_deref()
                .and_then(ErrorKind::parse)
                .unwrap_or(fallback);
            Error::new(kind).with_message(envelope.error)
        }
        Err(_) => Error::new(fallback).with_message(format!("remote error status {status}")),
    }
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 413 | 415 | 422 => ErrorKind::Usage,
        401 | 403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        409 | 423 => ErrorKind::Busy,
        500..=599 => ErrorKind::Internal,
        _ => ErrorKind::Network,
    }
}
