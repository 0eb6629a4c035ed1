//! # Mock Backend
//!
//! Utilities for testing loaders and feature hooks without a real backend.
//!
//! [`MockApiClient`] implements [`ApiClient`] from a list of expectations:
//!
//! ```ignore
//! let mock = MockApiClient::new();
//! mock.expect_get("/api/orgs/1").return_ok(json!({"id": 1, "title": "Org"}));
//!
//! let org: Organization = get_json(&mock, "/api/orgs/1").await?;
//! mock.verify(); // every expectation met, nothing unexpected
//! ```
//!
//! Each request consumes the first unused expectation with the same method and path.
//! A request nobody expected fails with [`LoadError::Backend`] and is reported by
//! [`MockApiClient::verify`]. An expectation can be held open with a [`Notify`] gate to
//! test what happens while a request is in flight.

use crate::clients::ApiClient;
use crate::framework::error::LoadError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

struct Expectation {
    method: Method,
    path: String,
    response: Result<Value, LoadError>,
    gate: Option<Arc<Notify>>,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    calls: Vec<(Method, String, Option<Value>)>,
    unexpected: Vec<String>,
}

/// An in-memory [`ApiClient`] driven by expectations.
#[derive(Clone, Default)]
pub struct MockApiClient {
    state: Arc<Mutex<MockState>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn expect_get(&self, path: &str) -> ExpectationBuilder {
        self.expect(Method::Get, path)
    }

    pub fn expect_post(&self, path: &str) -> ExpectationBuilder {
        self.expect(Method::Post, path)
    }

    pub fn expect_patch(&self, path: &str) -> ExpectationBuilder {
        self.expect(Method::Patch, path)
    }

    pub fn expect_delete(&self, path: &str) -> ExpectationBuilder {
        self.expect(Method::Delete, path)
    }

    fn expect(&self, method: Method, path: &str) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            path: path.to_string(),
            gate: None,
            state: self.state.clone(),
        }
    }

    /// Number of requests received for `method` + `path`, expected or not.
    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(m, p, _)| *m == method && p == path)
            .count()
    }

    /// Body of the most recent request with a body sent to `path`.
    pub fn last_body(&self, path: &str) -> Option<Value> {
        self.lock()
            .calls
            .iter()
            .rev()
            .find(|(_, p, body)| p == path && body.is_some())
            .and_then(|(_, _, body)| body.clone())
    }

    /// Panics unless every expectation was consumed and no unexpected request arrived.
    pub fn verify(&self) {
        let state = self.lock();
        if !state.unexpected.is_empty() {
            panic!("Unexpected requests: {:?}", state.unexpected);
        }
        if !state.expectations.is_empty() {
            let remaining: Vec<String> = state
                .expectations
                .iter()
                .map(|e| format!("{} {}", e.method, e.path))
                .collect();
            panic!(
                "Not all expectations were met. {} remaining: {:?}",
                remaining.len(),
                remaining
            );
        }
    }

    async fn respond(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, LoadError> {
        let (response, gate) = {
            let mut state = self.lock();
            state.calls.push((method, path.to_string(), body));
            let position = state
                .expectations
                .iter()
                .position(|e| e.method == method && e.path == path);
            match position.and_then(|i| state.expectations.remove(i)) {
                Some(expectation) => (expectation.response, expectation.gate),
                None => {
                    let request = format!("{method} {path}");
                    state.unexpected.push(request.clone());
                    return Err(LoadError::Backend(format!("unexpected request: {request}")));
                }
            }
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }
        response
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn get(&self, path: &str) -> Result<Value, LoadError> {
        self.respond(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, LoadError> {
        self.respond(Method::Post, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, LoadError> {
        self.respond(Method::Patch, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), LoadError> {
        self.respond(Method::Delete, path, None).await.map(|_| ())
    }
}

/// Builder for one expected request.
pub struct ExpectationBuilder {
    method: Method,
    path: String,
    gate: Option<Arc<Notify>>,
    state: Arc<Mutex<MockState>>,
}

impl ExpectationBuilder {
    /// Holds the response until `gate` is notified.
    pub fn held_by(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn return_ok(self, body: Value) {
        self.push(Ok(body));
    }

    pub fn return_err(self, error: LoadError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Value, LoadError>) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.expectations.push_back(Expectation {
            method: self.method,
            path: self.path,
            response,
            gate: self.gate,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_client_with_expectations() {
        let mock = MockApiClient::new();
        mock.expect_get("/api/orgs/1").return_ok(json!({"id": 1}));
        mock.expect_patch("/api/orgs/1/campaigns/2")
            .return_ok(json!({"id": 2, "title": "New"}));

        assert_eq!(mock.get("/api/orgs/1").await.unwrap(), json!({"id": 1}));
        let updated = mock
            .patch("/api/orgs/1/campaigns/2", json!({"title": "New"}))
            .await
            .unwrap();
        assert_eq!(updated["title"], "New");
        assert_eq!(mock.last_body("/api/orgs/1/campaigns/2"), Some(json!({"title": "New"})));
        assert_eq!(mock.calls(Method::Get, "/api/orgs/1"), 1);

        mock.verify();
    }

    #[tokio::test]
    async fn unexpected_request_fails_and_is_reported() {
        let mock = MockApiClient::new();
        let err = mock.get("/api/nope").await.unwrap_err();
        assert_eq!(err, LoadError::Backend("unexpected request: GET /api/nope".into()));

        let verified = std::panic::catch_unwind(|| mock.verify());
        assert!(verified.is_err());
    }

    #[tokio::test]
    async fn gated_expectation_waits_for_release() {
        let mock = MockApiClient::new();
        let gate = Arc::new(Notify::new());
        mock.expect_get("/api/slow").held_by(gate.clone()).return_ok(json!(1));

        let pending = {
            let mock = mock.clone();
            tokio::spawn(async move { mock.get("/api/slow").await })
        };
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        gate.notify_one();
        assert_eq!(pending.await.unwrap().unwrap(), json!(1));
    }

    #[tokio::test]
    async fn errors_are_returned_as_configured() {
        let mock = MockApiClient::new();
        mock.expect_delete("/api/orgs/1/campaigns/2").return_err(LoadError::Http {
            status: 403,
            message: "forbidden".into(),
        });
        let err = mock.delete("/api/orgs/1/campaigns/2").await.unwrap_err();
        assert!(matches!(err, LoadError::Http { status: 403, .. }));
        mock.verify();
    }
}
