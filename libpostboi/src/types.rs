//! Core types for Postboi

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PostboiError, Result};

/// One of the three publishing destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    /// Blog CMS (WordPress)
    Blog,
    /// Social page (Facebook)
    Page,
    /// Business social-media account (Instagram)
    BusinessAccount,
}

impl PlatformKind {
    pub const ALL: [PlatformKind; 3] = [
        PlatformKind::Blog,
        PlatformKind::Page,
        PlatformKind::BusinessAccount,
    ];

    /// Canonical identifier (`blog`, `page`, `business_account`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::Page => "page",
            Self::BusinessAccount => "business_account",
        }
    }

    /// Name of the service behind this platform, for humans
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Blog => "WordPress",
            Self::Page => "Facebook",
            Self::BusinessAccount => "Instagram",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = PostboiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "blog" | "wordpress" => Ok(Self::Blog),
            "page" | "facebook" => Ok(Self::Page),
            "business_account" | "instagram" => Ok(Self::BusinessAccount),
            other => Err(PostboiError::InvalidInput(format!(
                "Unknown platform '{}'. Valid platforms: blog, page, business_account",
                other
            ))),
        }
    }
}

/// Canonical input of one publishing run.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub image_path: PathBuf,
    pub caption: String,
    pub platforms: BTreeSet<PlatformKind>,
}

impl PublishRequest {
    pub fn new(
        image_path: impl Into<PathBuf>,
        caption: impl Into<String>,
        platforms: impl IntoIterator<Item = PlatformKind>,
    ) -> Self {
        Self {
            image_path: image_path.into(),
            caption: caption.into(),
            platforms: platforms.into_iter().collect(),
        }
    }

    /// Build a request from user-supplied platform identifiers.
    ///
    /// Duplicates collapse. An empty list or any unknown identifier is an
    /// `InvalidInput` error.
    pub fn parse<S: AsRef<str>>(
        image_path: impl Into<PathBuf>,
        caption: impl Into<String>,
        platform_names: &[S],
    ) -> Result<Self> {
        let platforms = platform_names
            .iter()
            .map(|name| name.as_ref().parse::<PlatformKind>())
            .collect::<Result<BTreeSet<_>>>()?;

        let request = Self {
            image_path: image_path.into(),
            caption: caption.into(),
            platforms,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.platforms.is_empty() {
            return Err(PostboiError::InvalidInput(
                "At least one platform must be selected".to_string(),
            ));
        }
        Ok(())
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }
}

/// One failed attempt in a platform's retry sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt number
    pub attempt_number: u32,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(attempt_number: u32, error_message: impl Into<String>) -> Self {
        Self {
            attempt_number,
            error_message: error_message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of one platform's full retry sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformResult {
    pub platform: PlatformKind,
    pub success: bool,
    /// Post URL / ID on success, final error message on failure
    pub detail: String,
    /// Failed attempts in order; empty when the first attempt succeeded
    pub attempts: Vec<AttemptRecord>,
}

impl PlatformResult {
    pub fn succeeded(
        platform: PlatformKind,
        detail: impl Into<String>,
        attempts: Vec<AttemptRecord>,
    ) -> Self {
        Self {
            platform,
            success: true,
            detail: detail.into(),
            attempts,
        }
    }

    pub fn failed(
        platform: PlatformKind,
        detail: impl Into<String>,
        attempts: Vec<AttemptRecord>,
    ) -> Self {
        Self {
            platform,
            success: false,
            detail: detail.into(),
            attempts,
        }
    }
}

/// Aggregated per-platform outcome of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub results: BTreeMap<PlatformKind, PlatformResult>,
    pub succeeded_count: usize,
    pub failed_count: usize,
}

impl WorkflowReport {
    pub fn new(results: BTreeMap<PlatformKind, PlatformResult>) -> Self {
        let succeeded_count = results.values().filter(|r| r.success).count();
        let failed_count = results.len() - succeeded_count;
        Self {
            results,
            succeeded_count,
            failed_count,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count == 0 && !self.results.is_empty()
    }

    pub fn get(&self, platform: PlatformKind) -> Option<&PlatformResult> {
        self.results.get(&platform)
    }

    pub fn successes(&self) -> impl Iterator<Item = &PlatformResult> {
        self.results.values().filter(|r| r.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PlatformResult> {
        self.results.values().filter(|r| !r.success)
    }
}

/// Result of a read-only credential probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub success: bool,
    pub message: String,
}

impl ConnectionStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
