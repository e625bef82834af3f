//! HTTP client for a remote version store.
//!
//! Speaks the JSON contract served by [`crate::server`]:
//! `GET /sites/{site}/versions/head`, `GET /sites/{site}/versions` and
//! `POST /sites/{site}/versions`.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{PagesmithError, PagesmithResult};
use crate::model::version::{NewVersion, VersionRecord};
use crate::store::version::VersionStore;

pub struct HttpVersionStore {
    base_url: Url,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl HttpVersionStore {
    pub fn new(config: &StoreConfig) -> PagesmithResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|err| {
            PagesmithError::ConfigError(format!("invalid store.base_url '{}': {err}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(PagesmithError::ConfigError(format!(
                "store.base_url '{}' cannot be used as a base URL",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            base_url,
            api_token: config.api_token.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/sites/{site}/versions[/extra]` with the site code escaped.
    fn versions_url(&self, site_code: &str, extra: Option<&str>) -> PagesmithResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                PagesmithError::ConfigError("store.base_url cannot be a base".to_string())
            })?;
            segments.pop_if_empty().extend(["sites", site_code, "versions"]);
            if let Some(extra) = extra {
                segments.push(extra);
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> PagesmithResult<T> {
        let status = response.status();
        debug!(status = %status, url = %response.url(), "version store responded");

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PagesmithError::Unauthorized(message),
            _ => PagesmithError::Remote {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl VersionStore for HttpVersionStore {
    async fn head(&self, site_code: &str) -> PagesmithResult<Option<VersionRecord>> {
        let url = self.versions_url(site_code, Some("head"))?;
        let response = self.authorize(self.client.get(url)).send().await?;
        Self::read_json(response).await
    }

    async fn list(&self, site_code: &str) -> PagesmithResult<Vec<VersionRecord>> {
        let url = self.versions_url(site_code, None)?;
        let response = self.authorize(self.client.get(url)).send().await?;
        Self::read_json(response).await
    }

    async fn append(&self, site_code: &str, version: NewVersion) -> PagesmithResult<VersionRecord> {
        let url = self.versions_url(site_code, None)?;
        let response = self
            .authorize(self.client.post(url).json(&version))
            .send()
            .await?;
        Self::read_json(response).await
    }
}
