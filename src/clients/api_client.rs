use crate::framework::LoadError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// JSON-over-HTTP access to the backend. Paths are absolute API paths such as
/// `/api/orgs/1/campaigns/7`.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, LoadError>;

    async fn post(&self, path: &str, body: Value) -> Result<Value, LoadError>;

    async fn patch(&self, path: &str, body: Value) -> Result<Value, LoadError>;

    async fn delete(&self, path: &str) -> Result<(), LoadError>;
}

/// Shared handle, as captured by loader closures.
pub type SharedApiClient = Arc<dyn ApiClient>;

/// GETs `path` and decodes the body into `T`.
#[instrument(skip(client))]
pub async fn get_json<T: DeserializeOwned>(client: &dyn ApiClient, path: &str) -> Result<T, LoadError> {
    let body = client.get(path).await?;
    debug!("Decoding response");
    Ok(serde_json::from_value(body)?)
}

/// PATCHes `path` with `data` and decodes the updated entity.
#[instrument(skip(client, data))]
pub async fn patch_json<B, T>(client: &dyn ApiClient, path: &str, data: &B) -> Result<T, LoadError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let body = serde_json::to_value(data)?;
    let updated = client.patch(path, body).await?;
    Ok(serde_json::from_value(updated)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockApiClient;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Org {
        id: u64,
        title: String,
    }

    #[tokio::test]
    async fn get_json_decodes_body() {
        let mock = MockApiClient::new();
        mock.expect_get("/api/orgs/1")
            .return_ok(json!({"id": 1, "title": "Local Chapter"}));

        let org: Org = get_json(&mock, "/api/orgs/1").await.unwrap();
        assert_eq!(org, Org { id: 1, title: "Local Chapter".into() });
        mock.verify();
    }

    #[tokio::test]
    async fn get_json_reports_shape_mismatch_as_decode_error() {
        let mock = MockApiClient::new();
        mock.expect_get("/api/orgs/1").return_ok(json!({"id": "one"}));

        let err = get_json::<Org>(&mock, "/api/orgs/1").await.unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }
}
