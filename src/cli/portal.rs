use anyhow::Context;
use serde_json::Value;

use crate::filter::{Location, ViewKind};

/// Thin HTTP client for the portal's list-view routes.
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

/// A loaded list view plus where the portal actually served it from.
#[derive(Debug, Clone)]
pub struct LoadedView {
    pub location: Location,
    pub redirected: bool,
    pub body: Value,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// GET a list view. `table` carries client-side controls (`sort`,
    /// `order`, `q`) appended after the filter query.
    pub async fn load(&self, location: &Location, table: &[(String, String)]) -> anyhow::Result<LoadedView> {
        let url = format!("{}{}", self.base_url, location.href());
        let response = self
            .http
            .get(&url)
            .query(table)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("failed to reach portal at {}", self.base_url))?;

        let final_path = response.url().path().to_string();
        let final_query = response.url().query().map(str::to_string);
        let status = response.status();
        let payload: Value = response.json().await.context("portal returned non-JSON body")?;

        if !status.is_success() {
            let message = payload["message"].as_str().unwrap_or("request failed");
            anyhow::bail!("portal returned {}: {}", status, message);
        }

        let served = Location::new(final_path, final_query);
        let redirected = ViewKind::from_path(served.path()) != ViewKind::from_path(location.path());
        Ok(LoadedView {
            location: served,
            redirected,
            body: payload["data"].clone(),
        })
    }
}
