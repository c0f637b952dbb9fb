use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use worldforge_schema::{ListQuery, ResponseEnvelope};

use super::normalize::ResponseEnvelopeNormalizer;
use crate::config::ApiConfig;
use crate::db::BackendKind;
use crate::error::WorldforgeError;
use crate::server::db_target::X_DB_TARGET;
use crate::utils::logging::debug_json;

/// Thin HTTP client for the entity API.
///
/// Every response of a read or write is passed through [`ResponseEnvelopeNormalizer`] before
/// it is handed back; deletes are returned as received.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    target: Option<BackendKind>,
    normalizer: Arc<ResponseEnvelopeNormalizer>,
}

impl ApiClient {
    pub fn new(cfg: &ApiConfig) -> Result<Self, WorldforgeError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            target: None,
            normalizer: Arc::new(ResponseEnvelopeNormalizer::default()),
        })
    }

    /// Copy of this client that sends `X-Db-Target` on every request.
    #[must_use]
    pub fn with_db_target(&self, target: BackendKind) -> Self {
        Self {
            target: Some(target),
            ..self.clone()
        }
    }

    fn url(&self, path: &str) -> Result<Url, WorldforgeError> {
        self.base_url
            .join(path)
            .map_err(|e| WorldforgeError::UnexpectedError(format!("invalid API path `{path}`: {e}")))
    }

    pub async fn list(
        &self,
        path: &str,
        query: &ListQuery,
    ) -> Result<ResponseEnvelope<Value>, WorldforgeError> {
        let request = self.http.get(self.url(path)?).query(query);
        self.send(path, request, true).await
    }

    pub async fn get(&self, path: &str) -> Result<ResponseEnvelope<Value>, WorldforgeError> {
        let request = self.http.get(self.url(path)?);
        self.send(path, request, true).await
    }

    pub async fn create(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<ResponseEnvelope<Value>, WorldforgeError> {
        let request = self.http.post(self.url(path)?).json(body);
        self.send(path, request, true).await
    }

    pub async fn update(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<ResponseEnvelope<Value>, WorldforgeError> {
        let request = self.http.patch(self.url(path)?).json(body);
        self.send(path, request, true).await
    }

    pub async fn delete(&self, path: &str) -> Result<ResponseEnvelope<Value>, WorldforgeError> {
        let request = self.http.delete(self.url(path)?);
        self.send(path, request, false).await
    }

    async fn send(
        &self,
        path: &str,
        request: RequestBuilder,
        normalize: bool,
    ) -> Result<ResponseEnvelope<Value>, WorldforgeError> {
        let request = match self.target {
            Some(kind) => request.header(X_DB_TARGET, kind.as_str()),
            None => request,
        };

        let body: Value = request.send().await?.error_for_status()?.json().await?;
        debug_json(path, &body);

        let body = if normalize {
            self.normalizer.normalize(path, body)
        } else {
            body
        };
        Ok(serde_json::from_value(body)?)
    }
}
