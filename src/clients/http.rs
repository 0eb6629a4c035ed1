//! reqwest-backed [`ApiClient`].

use crate::clients::api_client::ApiClient;
use crate::framework::LoadError;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Talks to the backend over HTTP. Response bodies of the form `{"data": ...}` are
/// unwrapped to their `data` member.
#[derive(Clone)]
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, LoadError> {
        let response = request
            .send()
            .await
            .map_err(|e| LoadError::Transport(e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Backend rejected request");
            return Err(LoadError::Http {
                status: status.as_u16(),
                message,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LoadError::Decode(e.to_string()))?;
        Ok(unwrap_envelope(body))
    }
}

fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut fields) if fields.len() == 1 && fields.contains_key("data") => {
            fields.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Value, LoadError> {
        debug!("Sending request");
        self.send(self.http.get(self.url(path))).await
    }

    #[instrument(skip(self, body))]
    async fn post(&self, path: &str, body: Value) -> Result<Value, LoadError> {
        debug!("Sending request");
        self.send(self.http.post(self.url(path)).json(&body)).await
    }

    #[instrument(skip(self, body))]
    async fn patch(&self, path: &str, body: Value) -> Result<Value, LoadError> {
        debug!("Sending request");
        self.send(self.http.patch(self.url(path)).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<(), LoadError> {
        debug!("Sending request");
        self.send(self.http.delete(self.url(path))).await.map(|_| ())
    }
}
