//! Mock publisher implementation for testing
//!
//! This module provides a configurable mock publisher that can simulate
//! successes, failures, transient errors that clear after a number of
//! attempts, and network latency. It's designed for integration tests that
//! verify the fan-out and retry logic without credentials or network access.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{PlatformError, Result};
use crate::platforms::Publisher;
use crate::types::PlatformKind;

/// Shared gauge of how many mock uploads are running at once
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest number of simultaneous uploads observed
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Configuration for mock publisher behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform the mock stands in for
    pub platform: PlatformKind,

    /// Number of uploads that fail before one succeeds (`usize::MAX` never succeeds)
    pub failures_before_success: usize,

    /// Error returned by failing uploads
    pub upload_error: PlatformError,

    /// Whether the connection probe succeeds
    pub connection_succeeds: bool,

    /// Delay before completing operations (simulates network latency)
    pub delay: Duration,

    /// Optional gauge shared between mocks
    pub probe: Option<ConcurrencyProbe>,

    /// Number of times upload has been called
    pub upload_call_count: Arc<Mutex<usize>>,

    /// Number of times test_connection has been called
    pub connection_call_count: Arc<Mutex<usize>>,

    /// Uploads that have been made (for verification)
    pub uploaded: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            platform: PlatformKind::Blog,
            failures_before_success: 0,
            upload_error: PlatformError::Posting("Mock upload failed".to_string()),
            connection_succeeds: true,
            delay: Duration::from_millis(0),
            probe: None,
            upload_call_count: Arc::new(Mutex::new(0)),
            connection_call_count: Arc::new(Mutex::new(0)),
            uploaded: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock publisher for testing
#[derive(Debug)]
pub struct MockPublisher {
    config: MockConfig,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockPublisher {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Create a mock publisher that always succeeds
    pub fn success(platform: PlatformKind) -> Self {
        Self::new(MockConfig {
            platform,
            ..Default::default()
        })
    }

    /// Create a mock publisher whose every upload fails with a posting error
    pub fn always_failing(platform: PlatformKind, error: &str) -> Self {
        Self::new(MockConfig {
            platform,
            failures_before_success: usize::MAX,
            upload_error: PlatformError::Posting(error.to_string()),
            connection_succeeds: false,
            ..Default::default()
        })
    }

    /// Create a mock publisher that fails `failures` times with a network error, then succeeds
    pub fn fails_then_succeeds(platform: PlatformKind, failures: usize, error: &str) -> Self {
        Self::new(MockConfig {
            platform,
            failures_before_success: failures,
            upload_error: PlatformError::Network(error.to_string()),
            ..Default::default()
        })
    }

    /// Create a mock publisher with unusable local settings
    pub fn misconfigured(platform: PlatformKind, error: &str) -> Self {
        Self::new(MockConfig {
            platform,
            failures_before_success: usize::MAX,
            upload_error: PlatformError::Configuration(error.to_string()),
            connection_succeeds: false,
            ..Default::default()
        })
    }

    /// Create a mock publisher with a delay
    pub fn with_delay(platform: PlatformKind, delay: Duration) -> Self {
        Self::new(MockConfig {
            platform,
            delay,
            ..Default::default()
        })
    }

    /// Attach a shared concurrency gauge
    pub fn with_probe(mut self, probe: ConcurrencyProbe) -> Self {
        self.config.probe = Some(probe);
        self
    }

    pub fn upload_call_count(&self) -> usize {
        *locked(&self.config.upload_call_count)
    }

    pub fn connection_call_count(&self) -> usize {
        *locked(&self.config.connection_call_count)
    }

    /// Image paths and captions of successful uploads
    pub fn uploaded(&self) -> Vec<(PathBuf, String)> {
        locked(&self.config.uploaded).clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn platform(&self) -> PlatformKind {
        self.config.platform
    }

    async fn upload(&self, image_path: &Path, caption: &str) -> Result<String> {
        let call_number = {
            let mut count = locked(&self.config.upload_call_count);
            *count += 1;
            *count
        };

        if let Some(probe) = &self.config.probe {
            probe.enter();
        }
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }
        if let Some(probe) = &self.config.probe {
            probe.exit();
        }

        if call_number <= self.config.failures_before_success {
            return Err(self.config.upload_error.clone().into());
        }

        locked(&self.config.uploaded).push((image_path.to_path_buf(), caption.to_string()));
        Ok(format!(
            "{}:mock-{}",
            self.config.platform.as_str(),
            uuid::Uuid::new_v4()
        ))
    }

    async fn test_connection(&self) -> Result<String> {
        *locked(&self.config.connection_call_count) += 1;

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if self.config.connection_succeeds {
            Ok(format!("Connected to mock {}", self.config.platform.display_name()))
        } else {
            Err(PlatformError::Authentication("Mock credentials rejected".to_string()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PostboiError;

    #[tokio::test]
    async fn test_mock_success() {
        let publisher = MockPublisher::success(PlatformKind::Page);
        assert_eq!(publisher.platform(), PlatformKind::Page);

        let id = publisher
            .upload(Path::new("/tmp/a.jpg"), "Test content")
            .await
            .unwrap();
        assert!(id.starts_with("page:mock-"));
        assert_eq!(publisher.upload_call_count(), 1);

        let uploaded = publisher.uploaded();
        assert_eq!(uploaded.len(), 1);
        assert_eq!(uploaded[0].1, "Test content");
    }

    #[tokio::test]
    async fn test_mock_always_failing() {
        let publisher = MockPublisher::always_failing(PlatformKind::Blog, "Server exploded");

        for _ in 0..3 {
            let err = publisher.upload(Path::new("/tmp/a.jpg"), "x").await.unwrap_err();
            assert!(err.to_string().contains("Server exploded"));
        }
        assert_eq!(publisher.upload_call_count(), 3);
        assert!(publisher.uploaded().is_empty());
    }

    #[tokio::test]
    async fn test_mock_fails_then_succeeds() {
        let publisher =
            MockPublisher::fails_then_succeeds(PlatformKind::BusinessAccount, 2, "Timeout");

        assert!(publisher.upload(Path::new("/tmp/a.jpg"), "x").await.is_err());
        assert!(publisher.upload(Path::new("/tmp/a.jpg"), "x").await.is_err());
        assert!(publisher.upload(Path::new("/tmp/a.jpg"), "x").await.is_ok());
        assert_eq!(publisher.upload_call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_misconfigured_is_not_retryable() {
        let publisher = MockPublisher::misconfigured(PlatformKind::BusinessAccount, "no base");
        let err = publisher.upload(Path::new("/tmp/a.jpg"), "x").await.unwrap_err();
        assert!(matches!(
            err,
            PostboiError::Platform(PlatformError::Configuration(_))
        ));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_mock_with_delay() {
        let publisher = MockPublisher::with_delay(PlatformKind::Blog, Duration::from_millis(50));

        let start = std::time::Instant::now();
        publisher.upload(Path::new("/tmp/a.jpg"), "x").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_mock_connection() {
        let ok = MockPublisher::success(PlatformKind::Blog);
        assert!(ok.test_connection().await.is_ok());
        assert_eq!(ok.connection_call_count(), 1);

        let bad = MockPublisher::always_failing(PlatformKind::Blog, "x");
        assert!(bad.test_connection().await.is_err());
    }

    #[tokio::test]
    async fn test_probe_tracks_peak() {
        let probe = ConcurrencyProbe::new();
        let a = MockPublisher::with_delay(PlatformKind::Blog, Duration::from_millis(50))
            .with_probe(probe.clone());
        let b = MockPublisher::with_delay(PlatformKind::Page, Duration::from_millis(50))
            .with_probe(probe.clone());

        let (ra, rb) = tokio::join!(
            a.upload(Path::new("/tmp/a.jpg"), "x"),
            b.upload(Path::new("/tmp/b.jpg"), "y")
        );
        assert!(ra.is_ok() && rb.is_ok());
        assert_eq!(probe.peak(), 2);
    }
}
