//! Concurrent dispatch to multiple platforms
//!
//! The [`ShareManager`] owns the configured publishers and a bounded worker
//! pool. Each requested platform runs as its own task holding one pool
//! permit for its whole retry sequence, so a slow or failing platform never
//! blocks or aborts another.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::platforms::facebook::FacebookPublisher;
use crate::platforms::instagram::InstagramPublisher;
use crate::platforms::wordpress::WordPressPublisher;
use crate::platforms::Publisher;
use crate::retry::{publish_with_retry, RetryPolicy};
use crate::types::{ConnectionStatus, PlatformKind, PlatformResult};

/// Adjusted payload for one platform
#[derive(Debug, Clone)]
pub struct ShareJob {
    pub platform: PlatformKind,
    pub image_path: PathBuf,
    pub caption: String,
}

/// Dispatch coordinator over a bounded worker pool
pub struct ShareManager {
    publishers: BTreeMap<PlatformKind, Arc<dyn Publisher>>,
    max_workers: usize,
    policy: RetryPolicy,
}

impl ShareManager {
    /// Create a manager with no publishers
    pub fn new(max_workers: usize, policy: RetryPolicy) -> Self {
        Self {
            publishers: BTreeMap::new(),
            max_workers: max_workers.max(1),
            policy,
        }
    }

    /// Register `publisher` under the platform it reports, replacing any previous one
    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publishers.insert(publisher.platform(), publisher);
        self
    }

    /// Build publishers for every enabled platform section in `config`.
    ///
    /// A publisher that cannot be constructed is logged and left out; it
    /// then reports as not configured.
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.workflow.request_timeout();
        let mut manager = Self::new(
            config.workflow.max_workers,
            RetryPolicy::from_config(&config.workflow),
        );

        if let Some(wp) = config.wordpress.as_ref().filter(|c| c.enabled) {
            match WordPressPublisher::new(wp, timeout) {
                Ok(publisher) => manager = manager.with_publisher(Arc::new(publisher)),
                Err(e) => warn!("Skipping WordPress publisher: {}", e),
            }
        }
        if let Some(fb) = config.facebook.as_ref().filter(|c| c.enabled) {
            match FacebookPublisher::new(fb, timeout) {
                Ok(publisher) => manager = manager.with_publisher(Arc::new(publisher)),
                Err(e) => warn!("Skipping Facebook publisher: {}", e),
            }
        }
        if let Some(ig) = config.instagram.as_ref().filter(|c| c.enabled) {
            match InstagramPublisher::new(ig, timeout) {
                Ok(publisher) => manager = manager.with_publisher(Arc::new(publisher)),
                Err(e) => warn!("Skipping Instagram publisher: {}", e),
            }
        }

        manager
    }

    pub fn publisher(&self, platform: PlatformKind) -> Option<&Arc<dyn Publisher>> {
        self.publishers.get(&platform)
    }

    pub fn configured_platforms(&self) -> Vec<PlatformKind> {
        self.publishers.keys().copied().collect()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one action per platform on the worker pool and collect the results.
    ///
    /// `factory` builds the action for a platform; duplicates in
    /// `platforms` run once. Every requested platform appears in the returned
    /// map: a task that panics is reported as failed with no attempts.
    pub async fn share_to_multiple<F, Fut>(
        &self,
        platforms: &[PlatformKind],
        factory: F,
    ) -> BTreeMap<PlatformKind, PlatformResult>
    where
        F: Fn(PlatformKind) -> Fut,
        Fut: Future<Output = PlatformResult> + Send + 'static,
    {
        self.fan_out(platforms, factory, |platform| {
            PlatformResult::failed(
                platform,
                format!("{} publish task failed unexpectedly", platform.display_name()),
                Vec::new(),
            )
        })
        .await
    }

    /// Publish each job through its platform's publisher with retries.
    ///
    /// A job whose platform has no publisher fails immediately with no
    /// attempts and never reaches the network.
    pub async fn publish(&self, jobs: Vec<ShareJob>) -> BTreeMap<PlatformKind, PlatformResult> {
        let jobs: BTreeMap<PlatformKind, ShareJob> =
            jobs.into_iter().map(|job| (job.platform, job)).collect();
        let platforms: Vec<PlatformKind> = jobs.keys().copied().collect();
        let policy = self.policy;

        self.share_to_multiple(&platforms, |platform| {
            let job = jobs.get(&platform).cloned();
            let publisher = self.publishers.get(&platform).cloned();

            async move {
                let (Some(job), Some(publisher)) = (job, publisher) else {
                    warn!("{} is not configured", platform.display_name());
                    return PlatformResult::failed(
                        platform,
                        format!("{} is not configured", platform.display_name()),
                        Vec::new(),
                    );
                };

                info!("Posting to platform: {}", platform.display_name());
                let result = publish_with_retry(platform, &policy, || {
                    publisher.upload(&job.image_path, &job.caption)
                })
                .await;

                if result.success {
                    info!("Successfully posted to {}: {}", platform.display_name(), result.detail);
                } else {
                    warn!("Failed to post to {}: {}", platform.display_name(), result.detail);
                }
                result
            }
        })
        .await
    }

    /// Probe every configured publisher concurrently
    pub async fn test_all_connections(&self) -> BTreeMap<PlatformKind, ConnectionStatus> {
        let platforms = self.configured_platforms();
        let request_timeout = self.policy.request_timeout;

        self.fan_out(
            &platforms,
            |platform| {
                let publisher = self.publishers.get(&platform).cloned();
                async move {
                    let Some(publisher) = publisher else {
                        return ConnectionStatus::failed(format!(
                            "{} is not configured",
                            platform.display_name()
                        ));
                    };
                    match tokio::time::timeout(request_timeout, publisher.test_connection()).await {
                        Ok(Ok(message)) => ConnectionStatus::ok(message),
                        Ok(Err(e)) => ConnectionStatus::failed(e.to_string()),
                        Err(_) => ConnectionStatus::failed(format!(
                            "{} connection test timed out after {}",
                            platform.display_name(),
                            humantime::format_duration(request_timeout)
                        )),
                    }
                }
            },
            |platform| {
                ConnectionStatus::failed(format!(
                    "{} connection test failed unexpectedly",
                    platform.display_name()
                ))
            },
        )
        .await
    }

    async fn fan_out<T, F, Fut, P>(
        &self,
        platforms: &[PlatformKind],
        factory: F,
        on_task_failure: P,
    ) -> BTreeMap<PlatformKind, T>
    where
        T: Send + 'static,
        F: Fn(PlatformKind) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        P: Fn(PlatformKind) -> T,
    {
        let requested: BTreeSet<PlatformKind> = platforms.iter().copied().collect();
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();

        for &platform in &requested {
            let action = factory(platform);
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                // The permit is held for the platform's whole sequence
                let _permit = semaphore.acquire_owned().await;
                (platform, action.await)
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((platform, value)) => {
                    results.insert(platform, value);
                }
                Err(e) => error!("Platform task failed: {}", e),
            }
        }

        for platform in requested {
            results
                .entry(platform)
                .or_insert_with(|| on_task_failure(platform));
        }

        results
    }
}
