//! Configuration management for Postboi

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::types::PlatformKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workflow: WorkflowConfig,
    pub wordpress: Option<WordPressConfig>,
    pub facebook: Option<FacebookConfig>,
    pub instagram: Option<InstagramConfig>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Retry, concurrency and temp-file settings for a workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub max_workers: usize,
    pub request_timeout_secs: u64,
    /// Source images larger than this are rejected before decoding
    pub max_image_size_mb: u64,
    /// Directory for adjusted image copies (defaults to the OS temp dir).
    ///
    /// When Instagram posts local files through `media_url_base`, this must
    /// be the directory published at that URL.
    pub work_dir: Option<String>,
    pub keep_adjusted_images: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_secs: 2,
            max_workers: 3,
            request_timeout_secs: 30,
            max_image_size_mb: 10,
            work_dir: None,
            keep_adjusted_images: false,
        }
    }
}

impl WorkflowConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(invalid("workflow.max_attempts", "must be at least 1"));
        }
        if self.max_workers == 0 {
            return Err(invalid("workflow.max_workers", "must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("workflow.request_timeout_secs", "must be at least 1"));
        }
        if self.max_image_size_mb == 0 {
            return Err(invalid("workflow.max_image_size_mb", "must be at least 1"));
        }
        Ok(())
    }

    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the directory adjusted images are written to
    pub fn expand_work_dir(&self) -> PathBuf {
        match &self.work_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).to_string()),
            None => std::env::temp_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPressConfig {
    pub enabled: bool,
    pub site_url: String,
    pub username: String,
    pub app_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacebookConfig {
    pub enabled: bool,
    pub page_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    pub enabled: bool,
    pub business_account_id: String,
    pub access_token: String,
    /// Public base URL under which adjusted images are reachable
    pub media_url_base: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and cross-section requirements
    pub fn validate(&self) -> Result<()> {
        self.workflow.validate()?;

        // Adjusted copies are what Instagram fetches, so they must be written
        // where media_url_base serves from
        let serves_media = self.instagram.as_ref().is_some_and(|c| {
            c.enabled
                && c.media_url_base
                    .as_deref()
                    .is_some_and(|base| !base.trim().is_empty())
        });
        if serves_media && self.workflow.work_dir.is_none() {
            return Err(invalid(
                "workflow.work_dir",
                "must be set to the directory served at instagram.media_url_base",
            ));
        }
        Ok(())
    }

    /// Platforms with an enabled configuration section
    pub fn enabled_platforms(&self) -> Vec<PlatformKind> {
        let mut platforms = Vec::new();
        if self.wordpress.as_ref().is_some_and(|c| c.enabled) {
            platforms.push(PlatformKind::Blog);
        }
        if self.facebook.as_ref().is_some_and(|c| c.enabled) {
            platforms.push(PlatformKind::Page);
        }
        if self.instagram.as_ref().is_some_and(|c| c.enabled) {
            platforms.push(PlatformKind::BusinessAccount);
        }
        platforms
    }
}

/// Resolve the configuration file path (`$POSTBOI_CONFIG`, else the XDG config dir)
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("POSTBOI_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("postboi").join("config.toml"))
}

fn invalid(field: &str, reason: &str) -> crate::error::PostboiError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
