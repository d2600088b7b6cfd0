//! Instagram business-account publisher
//!
//! Instagram's content API cannot take an upload: it fetches the image from
//! a public URL. Posting is two steps, creating a media container and then
//! publishing it once Instagram has processed the image.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{file_name, http_client, map_request_error, read_json, Publisher, GRAPH_API_BASE};
use crate::adjust::is_remote;
use crate::config::InstagramConfig;
use crate::error::{PlatformError, Result};
use crate::types::PlatformKind;

/// Pause between creating the container and publishing it
const PROCESSING_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    username: String,
}

#[derive(Debug)]
pub struct InstagramPublisher {
    client: reqwest::Client,
    api_base: String,
    account_id: String,
    access_token: SecretString,
    media_url_base: Option<String>,
    processing_wait: Duration,
}

impl InstagramPublisher {
    pub fn new(config: &InstagramConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_base: GRAPH_API_BASE.to_string(),
            account_id: config.business_account_id.trim().to_string(),
            access_token: SecretString::from(config.access_token.trim().to_string()),
            media_url_base: config
                .media_url_base
                .as_deref()
                .map(|base| base.trim().trim_end_matches('/').to_string())
                .filter(|base| !base.is_empty()),
            processing_wait: PROCESSING_WAIT,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_processing_wait(mut self, wait: Duration) -> Self {
        self.processing_wait = wait;
        self
    }

    fn check_config(&self) -> Result<()> {
        if self.account_id.is_empty() || self.access_token.expose_secret().is_empty() {
            return Err(PlatformError::Configuration(
                "Instagram business_account_id and access_token are required".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// URL Instagram will fetch the image from.
    ///
    /// An `http(s)` path is used as-is. A local file is expected to be
    /// served under `media_url_base` by its file name.
    pub fn public_image_url(&self, image_path: &Path) -> Result<String> {
        if is_remote(image_path) {
            return Ok(image_path.to_string_lossy().into_owned());
        }

        match &self.media_url_base {
            Some(base) if base.starts_with("http://") || base.starts_with("https://") => {
                Ok(format!("{}/{}", base, file_name(image_path)))
            }
            Some(base) => Err(PlatformError::Configuration(format!(
                "Instagram media_url_base must start with http:// or https:// (got '{}')",
                base
            ))
            .into()),
            None => Err(PlatformError::Configuration(
                "Instagram requires a publicly reachable image URL; set media_url_base".to_string(),
            )
            .into()),
        }
    }

    async fn create_container(&self, image_url: &str, caption: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/{}/media", self.api_base, self.account_id))
            .form(&[
                ("image_url", image_url),
                ("caption", caption),
                ("access_token", self.access_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| map_request_error(PlatformKind::BusinessAccount, "create container", e))?;

        let container: IdResponse =
            read_json(PlatformKind::BusinessAccount, "create container", response).await?;
        Ok(container.id)
    }

    async fn publish_container(&self, container_id: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/{}/media_publish", self.api_base, self.account_id))
            .form(&[
                ("creation_id", container_id),
                ("access_token", self.access_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| map_request_error(PlatformKind::BusinessAccount, "publish", e))?;

        let published: IdResponse =
            read_json(PlatformKind::BusinessAccount, "publish", response).await?;
        Ok(published.id)
    }
}

#[async_trait]
impl Publisher for InstagramPublisher {
    fn platform(&self) -> PlatformKind {
        PlatformKind::BusinessAccount
    }

    async fn upload(&self, image_path: &Path, caption: &str) -> Result<String> {
        self.check_config()?;
        let image_url = self.public_image_url(image_path)?;

        let container_id = self.create_container(&image_url, caption).await?;
        debug!(container_id = %container_id, "Created Instagram media container");

        tokio::time::sleep(self.processing_wait).await;

        let media_id = self.publish_container(&container_id).await?;
        Ok(format!("Posted to Instagram: {}", media_id))
    }

    async fn test_connection(&self) -> Result<String> {
        self.check_config()?;

        let response = self
            .client
            .get(format!("{}/{}", self.api_base, self.account_id))
            .bearer_auth(self.access_token.expose_secret())
            .query(&[("fields", "username")])
            .send()
            .await
            .map_err(|e| map_request_error(PlatformKind::BusinessAccount, "connection test", e))?;

        let account: AccountResponse =
            read_json(PlatformKind::BusinessAccount, "connection test", response).await?;
        Ok(format!("Connected to Instagram: @{}", account.username))
    }
}
