//! HTTP transport to the backend.
//!
//! One GET per call, no retry, no caching; timeouts are whatever the
//! underlying client defaults to. The [`Transport`] trait exists so the
//! orchestrator and the probe can be driven against a fake in tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DatasourceError, ErrorBody};
use crate::model::DatasourceSettings;

// ------------------------------------------------------------------ //
//  Trait                                                              //
// ------------------------------------------------------------------ //

/// Status line of a response whose body was never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
}

/// Async GET access to the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET {base}{path}?{query}` and decode the body as JSON.
    ///
    /// `query` is appended only when non-empty. Fails with
    /// [`DatasourceError::Network`] when no response arrived at all, and
    /// with [`DatasourceError::Transport`] for a non-success status or a
    /// body that is not JSON.
    async fn fetch(&self, path: &str, query: &str) -> Result<Value, DatasourceError>;

    /// `GET {base}{path}`, reporting only the status line.
    ///
    /// Any status the server produced is an `Ok`; only a request that never
    /// got an answer is an error. The probe needs that distinction.
    async fn ping(&self, path: &str) -> Result<RawResponse, DatasourceError>;
}

// ------------------------------------------------------------------ //
//  HttpTransport (production)                                         //
// ------------------------------------------------------------------ //

/// Envelope some backend errors arrive in: `{"error": {code, message}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

/// Production transport over a shared [`reqwest::Client`].
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(settings: &DatasourceSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        }
    }
}

fn status_text(status: reqwest::StatusCode) -> String {
    status.canonical_reason().unwrap_or("").to_string()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, path: &str, query: &str) -> Result<Value, DatasourceError> {
        let url = self.url(path, query);
        debug!(url = %url, "backend fetch");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DatasourceError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            // Best effort: the backend sometimes explains itself in the body.
            let body = resp.json::<ErrorEnvelope>().await.ok().and_then(|e| e.error);
            return Err(DatasourceError::Transport {
                status: status.as_u16(),
                status_text: status_text(status),
                body,
            });
        }

        match resp.json::<Value>().await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(url = %url, error = %e, "backend body is not JSON");
                Err(DatasourceError::Transport {
                    status: status.as_u16(),
                    status_text: status_text(status),
                    body: None,
                })
            }
        }
    }

    async fn ping(&self, path: &str) -> Result<RawResponse, DatasourceError> {
        let url = self.url(path, "");
        debug!(url = %url, "backend ping");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DatasourceError::Network(e.to_string()))?;

        let status = resp.status();
        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status_text(status),
        })
    }
}

// ------------------------------------------------------------------ //
//  FakeTransport (for tests)                                          //
// ------------------------------------------------------------------ //

/// In-memory transport serving canned outcomes, keyed by path.
///
/// Records every `(path, query)` fetched so tests can assert on the exact
/// requests the orchestrator issued. Unrouted paths answer 404, like a
/// backend that has never heard of the series.
#[derive(Default)]
pub struct FakeTransport {
    routes: HashMap<String, Result<Value, DatasourceError>>,
    ping_outcome: Option<Result<RawResponse, DatasourceError>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `outcome` for fetches of `path`.
    pub fn route(mut self, path: &str, outcome: Result<Value, DatasourceError>) -> Self {
        self.routes.insert(path.to_string(), outcome);
        self
    }

    /// Serve `outcome` for pings.
    pub fn on_ping(mut self, outcome: Result<RawResponse, DatasourceError>) -> Self {
        self.ping_outcome = Some(outcome);
        self
    }

    /// `(path, query)` pairs fetched so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, path: &str, query: &str) -> Result<Value, DatasourceError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), query.to_string()));
        match self.routes.get(path) {
            Some(outcome) => outcome.clone(),
            None => Err(DatasourceError::Transport {
                status: 404,
                status_text: "Not Found".to_string(),
                body: None,
            }),
        }
    }

    async fn ping(&self, _path: &str) -> Result<RawResponse, DatasourceError> {
        match &self.ping_outcome {
            Some(outcome) => outcome.clone(),
            None => Ok(RawResponse {
                status: 200,
                status_text: "OK".to_string(),
            }),
        }
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
