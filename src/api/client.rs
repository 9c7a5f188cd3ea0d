use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use super::error::ClientError;
use super::paginated::PaginatedResult;
use crate::filter::{FilterState, ViewKind};

/// The external REST backend, as the portal sees it.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Load one page of a list view, keyed by the effective filters.
    async fn list(
        &self,
        filters: &FilterState,
        token: Option<&str>,
    ) -> Result<PaginatedResult<Value>, ClientError>;

    async fn fetch(&self, view: ViewKind, id: &str, token: Option<&str>) -> Result<Value, ClientError>;

    async fn ping(&self) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpDirectoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|_| ClientError::InvalidUrl(base_url.clone()))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full list URL: `{base}/{view}?{filters}&page=N`.
    pub fn list_url(&self, filters: &FilterState) -> Result<Url, ClientError> {
        let mut url = self.endpoint_url(&filters.view().endpoint())?;
        url.query_pairs_mut().extend_pairs(filters.to_query_pairs());
        Ok(url)
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, ClientError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|_| ClientError::InvalidUrl(raw))
    }

    async fn get_json(&self, url: Url, token: Option<&str>) -> Result<Value, ClientError> {
        let mut request = self.http.get(url.clone()).header("accept", "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let started = std::time::Instant::now();
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%url, status = status.as_u16(), elapsed_ms = started.elapsed().as_millis() as u64, "backend request");

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
                .to_string();
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DirectoryApi for HttpDirectoryClient {
    async fn list(
        &self,
        filters: &FilterState,
        token: Option<&str>,
    ) -> Result<PaginatedResult<Value>, ClientError> {
        let url = self.list_url(filters)?;
        let body = self.get_json(url, token).await?;
        // some endpoints wrap the page in { "data": { ...page } }
        let page = match body.get("data") {
            Some(inner) if inner.get("current_page").is_some() => inner.clone(),
            _ => body,
        };
        serde_json::from_value(page).map_err(|e| ClientError::Status {
            status: 502,
            message: format!("unexpected list payload: {}", e),
        })
    }

    async fn fetch(&self, view: ViewKind, id: &str, token: Option<&str>) -> Result<Value, ClientError> {
        let mut url = self.endpoint_url(&view.endpoint())?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .push(id);
        let body = self.get_json(url, token).await?;
        Ok(match body.get("data") {
            Some(inner) if inner.is_object() => inner.clone(),
            _ => body,
        })
    }

    async fn ping(&self) -> Result<(), ClientError> {
        let response = self
            .http
            .get(&self.base_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;
        if response.status().is_server_error() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                message: "backend unhealthy".to_string(),
            });
        }
        Ok(())
    }
}
