//! HTTP client for the backend data API
//!
//! One attempt per call: failures are returned to the caller, which turns
//! them into an error state.

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use fd_core::{Credential, Dataset, Session};

use crate::query::{SaveQueryRequest, SavedQuery};
use super::{decode_payload, DataApi, TimeSeriesBatch};

#[derive(Serialize)]
struct BatchRequest<'a> {
    entities: &'a [String],
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    series: TimeSeriesBatch,
}

#[derive(Serialize)]
struct CredentialExchange<'a> {
    credential: &'a str,
}

/// `DataApi` over HTTP with bearer-token authentication
pub struct HttpDataApi {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpDataApi {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    /// Use `token` for subsequent requests
    pub fn with_token(self, token: impl Into<String>) -> Self {
        *self.token.write() = Some(token.into());
        self
    }

    /// Replace the session token, e.g. after signing in
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.read().as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> anyhow::Result<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .with_context(|| format!("request for {} failed", what))?
            .error_for_status()
            .with_context(|| format!("backend rejected request for {}", what))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("invalid response body for {}", what))
    }

    async fn send_dataset(&self, request: RequestBuilder, what: &str) -> anyhow::Result<Dataset> {
        let payload: serde_json::Value = self.send(request, what).await?;
        Ok(decode_payload(payload)?)
    }
}

#[async_trait]
impl DataApi for HttpDataApi {
    async fn fetch_dataset(&self, source: &str) -> anyhow::Result<Dataset> {
        let request = self.client.get(self.url(&format!("datasets/{}", source)));
        let dataset = self.send_dataset(request, source).await?;
        tracing::debug!("Fetched {} rows for {}", dataset.len(), source);
        Ok(dataset)
    }

    async fn list_queries(&self) -> anyhow::Result<Vec<SavedQuery>> {
        self.send(self.client.get(self.url("queries")), "saved queries").await
    }

    async fn create_query(&self, request: &SaveQueryRequest) -> anyhow::Result<SavedQuery> {
        let http = self.client.post(self.url("queries")).json(request);
        self.send(http, &format!("saving query '{}'", request.name)).await
    }

    async fn execute_query(&self, query_id: i64) -> anyhow::Result<Dataset> {
        let request = self.client.post(self.url(&format!("queries/{}/execute", query_id)));
        self.send_dataset(request, &format!("query {}", query_id)).await
    }

    async fn time_series_batch(&self, entities: &[String]) -> anyhow::Result<TimeSeriesBatch> {
        let request = self
            .client
            .post(self.url("timeseries/batch"))
            .json(&BatchRequest { entities });
        let response: BatchResponse = self
            .send(request, &format!("{} time series", entities.len()))
            .await?;
        Ok(response.series)
    }

    async fn exchange_credential(&self, credential: &Credential) -> anyhow::Result<Session> {
        let request = self
            .client
            .post(self.url("auth/login"))
            .json(&CredentialExchange {
                credential: credential.as_str(),
            });
        let session: Session = self.send(request, "login").await?;
        self.set_token(Some(session.access_token.clone()));
        Ok(session)
    }

    fn source_name(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let api = HttpDataApi::new("https://api.example.com/v1/");
        assert_eq!(api.url("/queries"), "https://api.example.com/v1/queries");
        assert_eq!(api.url("datasets/financials"), "https://api.example.com/v1/datasets/financials");
        assert_eq!(api.source_name(), "https://api.example.com/v1");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        let api = HttpDataApi::new("http://127.0.0.1:9").with_token("t");
        assert!(api.fetch_dataset("financials").await.is_err());
    }
}
