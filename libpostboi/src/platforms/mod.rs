//! Publisher abstraction and implementations
//!
//! Every destination sits behind the [`Publisher`] trait: one call that
//! uploads an image with its caption, and one read-only connection probe.
//! The wire protocol of each service stays inside its module.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use libpostboi::config::FacebookConfig;
//! use libpostboi::platforms::{facebook::FacebookPublisher, Publisher};
//!
//! # async fn example() -> libpostboi::Result<()> {
//! let config = FacebookConfig {
//!     enabled: true,
//!     page_id: "1234567890".to_string(),
//!     access_token: "page-token".to_string(),
//! };
//! let publisher = FacebookPublisher::new(&config, Duration::from_secs(30))?;
//!
//! println!("{}", publisher.test_connection().await?);
//! let url = publisher.upload(Path::new("/tmp/photo.jpg"), "Hello!").await?;
//! println!("Posted: {}", url);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{PlatformError, PostboiError, Result};
use crate::types::PlatformKind;

pub mod facebook;
pub mod instagram;
pub mod wordpress;

// Mock publisher is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Graph API version shared by the page and business-account publishers
pub(crate) const GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";

/// Uniform contract of every publishing destination
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Platform this publisher posts to
    fn platform(&self) -> PlatformKind;

    /// Upload the image and create a post with `caption`.
    ///
    /// Returns a success artifact such as the post URL or ID.
    ///
    /// # Errors
    ///
    /// Remote failures come back as `PlatformError::{Authentication,
    /// Validation, Posting, Network, RateLimit}`. Unusable local settings are
    /// `PlatformError::Configuration`, which is never retried.
    async fn upload(&self, image_path: &Path, caption: &str) -> Result<String>;

    /// Read-only probe of the stored credentials. Creates no content.
    async fn test_connection(&self) -> Result<String>;
}

/// Build the HTTP client shared by a publisher's requests
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            PlatformError::Configuration(format!("Failed to build HTTP client: {}", e)).into()
        })
}

/// Classify a transport-level failure
///
/// The request URL is stripped from the message since Graph API calls carry
/// the access token in their query string.
pub(crate) fn map_request_error(
    platform: PlatformKind,
    context: &str,
    error: reqwest::Error,
) -> PostboiError {
    let name = platform.display_name();
    let error = error.without_url();
    if error.is_timeout() {
        PlatformError::Network(format!("{} {} timed out: {}", name, context, error)).into()
    } else if error.is_builder() {
        PlatformError::Configuration(format!("{} {} request is invalid: {}", name, context, error))
            .into()
    } else {
        PlatformError::Network(format!("{} {} connection error: {}", name, context, error)).into()
    }
}

/// Classify a non-2xx response by its status code
pub(crate) fn map_status_error(
    platform: PlatformKind,
    context: &str,
    status: u16,
    message: &str,
) -> PostboiError {
    let detail = format!(
        "{} {} failed ({}): {}",
        platform.display_name(),
        context,
        status,
        message
    );
    let error = match status {
        401 | 403 => PlatformError::Authentication(detail),
        429 => PlatformError::RateLimit(detail),
        400..=499 => PlatformError::Validation(detail),
        _ => PlatformError::Posting(detail),
    };
    error.into()
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    message: String,
}

/// Pull the human-readable message out of an error response body.
///
/// Understands Graph API (`{"error":{"message":..}}`) and WordPress
/// (`{"message":..}`) shapes, falling back to the raw text.
pub(crate) fn error_message_from_body(body: &str) -> String {
    if let Ok(graph) = serde_json::from_str::<GraphErrorBody>(body) {
        return graph.error.message;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Turn a response into its JSON body, mapping non-2xx statuses to errors
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    platform: PlatformKind,
    context: &str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(map_status_error(
            platform,
            context,
            status.as_u16(),
            &error_message_from_body(&body),
        ));
    }

    response.json::<T>().await.map_err(|e| {
        PlatformError::Posting(format!(
            "{} {} returned an unexpected response: {}",
            platform.display_name(),
            context,
            e
        ))
        .into()
    })
}

/// MIME type guessed from the file extension (defaults to JPEG)
pub(crate) fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "image.jpg".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_type_for(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("noext")), "image/jpeg");
    }

    #[test]
    fn test_status_mapping() {
        let auth = map_status_error(PlatformKind::Page, "upload", 401, "Invalid OAuth token");
        assert!(matches!(
            auth,
            PostboiError::Platform(PlatformError::Authentication(_))
        ));

        let forbidden = map_status_error(PlatformKind::Blog, "upload", 403, "nope");
        assert!(matches!(
            forbidden,
            PostboiError::Platform(PlatformError::Authentication(_))
        ));

        let limited = map_status_error(PlatformKind::Page, "upload", 429, "slow down");
        assert!(matches!(
            limited,
            PostboiError::Platform(PlatformError::RateLimit(_))
        ));

        let invalid = map_status_error(PlatformKind::BusinessAccount, "publish", 400, "bad");
        assert!(matches!(
            invalid,
            PostboiError::Platform(PlatformError::Validation(_))
        ));

        let server = map_status_error(PlatformKind::Blog, "create post", 502, "gateway");
        assert!(matches!(
            server,
            PostboiError::Platform(PlatformError::Posting(_))
        ));
    }

    #[test]
    fn test_status_error_mentions_platform_and_context() {
        let error = map_status_error(PlatformKind::Blog, "media upload", 500, "oops");
        let message = error.to_string();
        assert!(message.contains("WordPress"));
        assert!(message.contains("media upload"));
        assert!(message.contains("500"));
        assert!(error.is_retryable());
    }

    #[test]
    fn test_error_message_from_graph_body() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190}}"#;
        assert_eq!(error_message_from_body(body), "Invalid OAuth access token.");
    }

    #[test]
    fn test_error_message_from_wordpress_body() {
        let body = r#"{"code":"rest_cannot_create","message":"Sorry, you are not allowed to create posts.","data":{"status":401}}"#;
        assert_eq!(
            error_message_from_body(body),
            "Sorry, you are not allowed to create posts."
        );
    }

    #[test]
    fn test_error_message_from_plain_body() {
        assert_eq!(error_message_from_body("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message_from_body(""), "Unknown error");
    }
}
