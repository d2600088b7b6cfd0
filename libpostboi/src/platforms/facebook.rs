//! Facebook page publisher over the Graph API

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{
    file_name, http_client, map_request_error, mime_type_for, read_json, Publisher, GRAPH_API_BASE,
};
use crate::config::FacebookConfig;
use crate::error::{PlatformError, Result};
use crate::types::PlatformKind;

#[derive(Debug, Deserialize)]
struct PhotoResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default = "unknown")]
    name: String,
}

fn unknown() -> String {
    "Unknown".to_string()
}

#[derive(Debug)]
pub struct FacebookPublisher {
    client: reqwest::Client,
    api_base: String,
    page_id: String,
    access_token: SecretString,
}

impl FacebookPublisher {
    pub fn new(config: &FacebookConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_base: GRAPH_API_BASE.to_string(),
            page_id: config.page_id.trim().to_string(),
            access_token: SecretString::from(config.access_token.trim().to_string()),
        })
    }

    /// Point the publisher at a different Graph API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn check_config(&self) -> Result<()> {
        if self.page_id.is_empty() || self.access_token.expose_secret().is_empty() {
            return Err(PlatformError::Configuration(
                "Facebook page_id and access_token are required".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for FacebookPublisher {
    fn platform(&self) -> PlatformKind {
        PlatformKind::Page
    }

    async fn upload(&self, image_path: &Path, caption: &str) -> Result<String> {
        self.check_config()?;

        let bytes = tokio::fs::read(image_path).await.map_err(|e| {
            PlatformError::Configuration(format!(
                "Cannot read image {}: {}",
                image_path.display(),
                e
            ))
        })?;

        let source = Part::bytes(bytes)
            .file_name(file_name(image_path))
            .mime_str(mime_type_for(image_path))
            .map_err(|e| map_request_error(PlatformKind::Page, "photo upload", e))?;

        let form = Form::new()
            .text("access_token", self.access_token.expose_secret().to_string())
            .text("message", caption.to_string())
            .part("source", source);

        let response = self
            .client
            .post(format!("{}/{}/photos", self.api_base, self.page_id))
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_request_error(PlatformKind::Page, "photo upload", e))?;

        let photo: PhotoResponse = read_json(PlatformKind::Page, "photo upload", response).await?;
        Ok(format!("https://www.facebook.com/{}", photo.id))
    }

    async fn test_connection(&self) -> Result<String> {
        self.check_config()?;

        let response = self
            .client
            .get(format!("{}/{}", self.api_base, self.page_id))
            .bearer_auth(self.access_token.expose_secret())
            .query(&[("fields", "name")])
            .send()
            .await
            .map_err(|e| map_request_error(PlatformKind::Page, "connection test", e))?;

        let page: PageResponse = read_json(PlatformKind::Page, "connection test", response).await?;
        Ok(format!("Connected to page: {}", page.name))
    }
}
