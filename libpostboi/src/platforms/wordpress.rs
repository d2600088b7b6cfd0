//! WordPress (blog) publisher over the WordPress REST API

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{file_name, http_client, map_request_error, mime_type_for, read_json, Publisher};
use crate::config::WordPressConfig;
use crate::error::{PlatformError, Result};
use crate::types::PlatformKind;

/// Longest title derived from a caption
const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    #[serde(default)]
    link: String,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    name: String,
}

#[derive(Debug)]
pub struct WordPressPublisher {
    client: reqwest::Client,
    site_url: String,
    username: String,
    app_password: SecretString,
}

impl WordPressPublisher {
    /// Create a publisher for `config`.
    ///
    /// Settings are checked lazily: an unusable site URL or missing
    /// credentials surface as `PlatformError::Configuration` on first use.
    pub fn new(config: &WordPressConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            site_url: config.site_url.trim().trim_end_matches('/').to_string(),
            username: config.username.trim().to_string(),
            // Application passwords are displayed with spaces for readability
            app_password: SecretString::from(config.app_password.replace(' ', "")),
        })
    }

    fn api_base(&self) -> Result<String> {
        if !(self.site_url.starts_with("http://") || self.site_url.starts_with("https://")) {
            return Err(PlatformError::Configuration(format!(
                "WordPress site_url must start with http:// or https:// (got '{}')",
                self.site_url
            ))
            .into());
        }
        if self.username.is_empty() || self.app_password.expose_secret().is_empty() {
            return Err(PlatformError::Configuration(
                "WordPress username and app_password are required".to_string(),
            )
            .into());
        }
        Ok(format!("{}/wp-json/wp/v2", self.site_url))
    }

    async fn upload_media(&self, api_base: &str, image_path: &Path) -> Result<u64> {
        let bytes = tokio::fs::read(image_path).await.map_err(|e| {
            PlatformError::Configuration(format!(
                "Cannot read image {}: {}",
                image_path.display(),
                e
            ))
        })?;

        let response = self
            .client
            .post(format!("{}/media", api_base))
            .basic_auth(&self.username, Some(self.app_password.expose_secret()))
            .header(reqwest::header::CONTENT_TYPE, mime_type_for(image_path))
            .header(
                reqwest::header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name(image_path)),
            )
            .body(bytes)
            .send()
            .await
            .map_err(|e| map_request_error(PlatformKind::Blog, "media upload", e))?;

        let media: MediaResponse = read_json(PlatformKind::Blog, "media upload", response).await?;
        debug!(media_id = media.id, "Uploaded media to WordPress");
        Ok(media.id)
    }

    async fn create_post(&self, api_base: &str, caption: &str, media_id: u64) -> Result<String> {
        let body = serde_json::json!({
            "title": title_from_caption(caption),
            "content": caption,
            "status": "publish",
            "featured_media": media_id,
        });

        let response = self
            .client
            .post(format!("{}/posts", api_base))
            .basic_auth(&self.username, Some(self.app_password.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error(PlatformKind::Blog, "create post", e))?;

        let post: PostResponse = read_json(PlatformKind::Blog, "create post", response).await?;
        if post.link.is_empty() {
            Ok(format!("WordPress post {}", post.id))
        } else {
            Ok(post.link)
        }
    }
}

#[async_trait]
impl Publisher for WordPressPublisher {
    fn platform(&self) -> PlatformKind {
        PlatformKind::Blog
    }

    async fn upload(&self, image_path: &Path, caption: &str) -> Result<String> {
        let api_base = self.api_base()?;
        let media_id = self.upload_media(&api_base, image_path).await?;
        self.create_post(&api_base, caption, media_id).await
    }

    async fn test_connection(&self) -> Result<String> {
        let api_base = self.api_base()?;
        let response = self
            .client
            .get(format!("{}/users/me", api_base))
            .basic_auth(&self.username, Some(self.app_password.expose_secret()))
            .send()
            .await
            .map_err(|e| map_request_error(PlatformKind::Blog, "connection test", e))?;

        let user: UserResponse =
            read_json(PlatformKind::Blog, "connection test", response).await?;
        Ok(format!("Connected to WordPress as {}", user.name))
    }
}

/// First caption line, capped at 100 chars, or `New Post`
fn title_from_caption(caption: &str) -> String {
    let first_line = caption.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        "New Post".to_string()
    } else {
        first_line.chars().take(MAX_TITLE_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PostboiError;

    fn config(site_url: &str) -> WordPressConfig {
        WordPressConfig {
            enabled: true,
            site_url: site_url.to_string(),
            username: "editor".to_string(),
            app_password: "abcd efgh ijkl mnop".to_string(),
        }
    }

    #[test]
    fn test_title_from_caption() {
        assert_eq!(title_from_caption("Sunset\nover the bay"), "Sunset");
        assert_eq!(title_from_caption(""), "New Post");
        assert_eq!(title_from_caption("\n\nbody"), "New Post");
        assert_eq!(title_from_caption(&"a".repeat(150)).chars().count(), 100);
    }

    #[test]
    fn test_api_base_strips_trailing_slash() {
        let publisher =
            WordPressPublisher::new(&config("https://blog.example.com/"), Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            publisher.api_base().unwrap(),
            "https://blog.example.com/wp-json/wp/v2"
        );
    }

    #[test]
    fn test_app_password_spaces_removed_and_redacted() {
        let publisher =
            WordPressPublisher::new(&config("https://blog.example.com"), Duration::from_secs(5))
                .unwrap();
        assert_eq!(publisher.app_password.expose_secret(), "abcdefghijklmnop");
        assert!(!format!("{:?}", publisher).contains("abcdefghijklmnop"));
    }

    #[tokio::test]
    async fn test_bad_site_url_is_configuration_error() {
        let publisher =
            WordPressPublisher::new(&config("blog.example.com"), Duration::from_secs(5)).unwrap();

        let err = publisher
            .upload(Path::new("/tmp/whatever.jpg"), "caption")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PostboiError::Platform(PlatformError::Configuration(_))
        ));
        assert!(!err.is_retryable());

        let err = publisher.test_connection().await.unwrap_err();
        assert!(err.to_string().contains("site_url"));
    }
}
