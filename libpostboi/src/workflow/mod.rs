//! Workflow orchestration
//!
//! [`Workflow::run`] is the entry point of a publishing run. It validates the
//! request, adjusts the caption and image for every selected platform, hands
//! the adjusted payloads to the [`ShareManager`], and folds everything into a
//! single [`WorkflowReport`].
//!
//! # Examples
//!
//! ```no_run
//! use libpostboi::{summarize, Config, PlatformKind, PublishRequest, Workflow};
//!
//! # async fn example() -> libpostboi::Result<()> {
//! let config = Config::load()?;
//! let workflow = Workflow::new(&config);
//!
//! let request = PublishRequest::new(
//!     "/home/me/photos/sunset.png",
//!     "Golden hour #sunset #photography",
//!     [PlatformKind::Blog, PlatformKind::BusinessAccount],
//! );
//! let report = workflow.run(request).await?;
//! println!("{}", summarize(&report));
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::adjust::{
    adjust_caption, adjust_image, check_file_size, is_remote, AdjustedImage, PlatformAdjustment,
};
use crate::config::{Config, WorkflowConfig};
use crate::error::Result;
use crate::share::{ShareJob, ShareManager};
use crate::types::{
    ConnectionStatus, PlatformKind, PlatformResult, PublishRequest, WorkflowReport,
};

pub mod summary;

pub use summary::{summarize, FailureCategory};

/// Publishing workflow bound to one configuration
pub struct Workflow {
    config: WorkflowConfig,
    share_manager: ShareManager,
}

impl Workflow {
    /// Create a workflow whose publishers come from `config`
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.workflow.clone(),
            share_manager: ShareManager::from_config(config),
        }
    }

    /// Create a workflow that dispatches through a caller-provided manager
    pub fn with_share_manager(config: WorkflowConfig, share_manager: ShareManager) -> Self {
        Self {
            config,
            share_manager,
        }
    }

    pub fn share_manager(&self) -> &ShareManager {
        &self.share_manager
    }

    /// Publish `request` to each of its platforms.
    ///
    /// Only a malformed request is an `Err`, and it is returned before any
    /// work is done. Everything else, including images that cannot be
    /// adjusted, ends up as a per-platform result in the report.
    ///
    /// An `http(s)` image path is passed through untouched to platforms that
    /// fetch images themselves; only the caption is adjusted for them.
    pub async fn run(&self, request: PublishRequest) -> Result<WorkflowReport> {
        request.validate()?;

        info!(
            image = %request.image_path.display(),
            platforms = request.platforms.len(),
            "Starting publishing run"
        );

        let prepared = self.adjust_all(&request).await;

        let mut results: BTreeMap<PlatformKind, PlatformResult> = BTreeMap::new();
        let mut jobs = Vec::new();
        let mut temp_images = Vec::new();

        for (platform, outcome) in prepared {
            match outcome {
                Ok(payload) => {
                    if let Some(adjusted) = payload.adjusted {
                        temp_images.push(adjusted.path);
                    }
                    jobs.push(ShareJob {
                        platform,
                        image_path: payload.image_path,
                        caption: payload.caption,
                    });
                }
                Err(detail) => {
                    warn!("Skipping {}: {}", platform.display_name(), detail);
                    results.insert(platform, PlatformResult::failed(platform, detail, Vec::new()));
                }
            }
        }

        results.extend(self.share_manager.publish(jobs).await);

        if !self.config.keep_adjusted_images {
            remove_temp_images(temp_images).await;
        }

        let report = WorkflowReport::new(results);
        info!(
            succeeded = report.succeeded_count,
            failed = report.failed_count,
            "Publishing run finished"
        );
        Ok(report)
    }

    /// Probe every configured publisher
    pub async fn test_connections(&self) -> BTreeMap<PlatformKind, ConnectionStatus> {
        self.share_manager.test_all_connections().await
    }

    /// Adjust caption and image for every platform on the blocking pool
    async fn adjust_all(
        &self,
        request: &PublishRequest,
    ) -> Vec<(PlatformKind, std::result::Result<Payload, String>)> {
        let remote = is_remote(&request.image_path);

        // One size check covers every platform since they share the source
        if !remote {
            if let Err(e) = check_file_size(&request.image_path, self.config.max_image_bytes()) {
                let detail = e.to_string();
                return request
                    .platforms
                    .iter()
                    .map(|&platform| (platform, Err(detail.clone())))
                    .collect();
            }
        }

        let work_dir = self.config.expand_work_dir();

        let tasks = request.platforms.iter().map(|&platform| {
            let image_path = request.image_path.clone();
            let caption = request.caption.clone();
            let work_dir = work_dir.clone();

            async move {
                if remote {
                    return (platform, remote_payload(platform, image_path, &caption));
                }

                let joined = tokio::task::spawn_blocking(move || {
                    let caption = adjust_caption(&caption, platform);
                    let adjusted = adjust_image(&image_path, platform, &work_dir)?;
                    Ok::<_, crate::error::PostboiError>(Payload {
                        caption,
                        image_path: adjusted.path.clone(),
                        adjusted: Some(adjusted),
                    })
                })
                .await;

                let outcome = match joined {
                    Ok(Ok(payload)) => {
                        debug!(
                            platform = %platform,
                            resized = payload.adjusted.as_ref().is_some_and(|a| a.was_resized()),
                            caption_chars = payload.caption.chars().count(),
                            "Adjusted content"
                        );
                        Ok(payload)
                    }
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(e) => {
                        error!("Adjustment task for {} failed: {}", platform, e);
                        Err(format!(
                            "{} adjustment task failed unexpectedly",
                            platform.display_name()
                        ))
                    }
                };
                (platform, outcome)
            }
        });

        join_all(tasks).await
    }
}

/// What one platform is handed: its caption and the image it should post
struct Payload {
    caption: String,
    image_path: PathBuf,
    /// Temp copy written for this platform, if any
    adjusted: Option<AdjustedImage>,
}

/// Caption-only adjustment for a URL source
fn remote_payload(
    platform: PlatformKind,
    image_url: PathBuf,
    caption: &str,
) -> std::result::Result<Payload, String> {
    if !PlatformAdjustment::for_platform(platform).accepts_image_url {
        return Err(format!(
            "{} needs a local image file, got {}",
            platform.display_name(),
            image_url.display()
        ));
    }

    debug!(platform = %platform, url = %image_url.display(), "Passing image URL through");
    Ok(Payload {
        caption: adjust_caption(caption, platform),
        image_path: image_url,
        adjusted: None,
    })
}

async fn remove_temp_images(paths: Vec<PathBuf>) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove adjusted image {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::mock::MockPublisher;
    use crate::retry::RetryPolicy;
    use image::{Rgb, RgbImage};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn fixture(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("source.png");
        RgbImage::from_pixel(width, height, Rgb([10, 120, 200]))
            .save(&path)
            .unwrap();
        path
    }

    fn workflow(work_dir: &Path, keep: bool, manager: ShareManager) -> Workflow {
        let config = WorkflowConfig {
            work_dir: Some(work_dir.display().to_string()),
            keep_adjusted_images: keep,
            ..Default::default()
        };
        Workflow::with_share_manager(config, manager)
    }

    fn quick_manager() -> ShareManager {
        ShareManager::new(
            3,
            RetryPolicy::new(3, Duration::from_millis(0), Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn test_empty_platform_set_rejected() {
        let dir = TempDir::new().unwrap();
        let blog = Arc::new(MockPublisher::success(PlatformKind::Blog));
        let workflow = workflow(dir.path(), false, quick_manager().with_publisher(blog.clone()));

        let request = PublishRequest::new(fixture(dir.path(), 10, 10), "hi", Vec::new());
        let err = workflow.run(request).await.unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert_eq!(blog.upload_call_count(), 0);
    }

    #[tokio::test]
    async fn test_publisher_receives_adjusted_copy() {
        let dir = TempDir::new().unwrap();
        let source = fixture(dir.path(), 2400, 1200);
        let instagram = Arc::new(MockPublisher::success(PlatformKind::BusinessAccount));
        let workflow = workflow(
            dir.path(),
            true,
            quick_manager().with_publisher(instagram.clone()),
        );

        let caption = format!(
            "Big launch {}",
            (0..35).map(|i| format!("#t{}", i)).collect::<Vec<_>>().join(" ")
        );
        let report = workflow
            .run(PublishRequest::new(&source, caption, [PlatformKind::BusinessAccount]))
            .await
            .unwrap();
        assert!(report.all_succeeded());

        let uploaded = instagram.uploaded();
        let (path, caption) = &uploaded[0];
        assert_ne!(path, &source);
        assert_eq!(crate::adjust::hashtags(caption).len(), 30);

        let adjusted = image::open(path).unwrap();
        assert_eq!((adjusted.width(), adjusted.height()), (1080, 540));
    }

    #[tokio::test]
    async fn test_temp_images_removed_after_run() {
        let dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let source = fixture(dir.path(), 64, 64);
        let blog = Arc::new(MockPublisher::success(PlatformKind::Blog));
        let workflow = workflow(work.path(), false, quick_manager().with_publisher(blog.clone()));

        workflow
            .run(PublishRequest::new(&source, "hi", [PlatformKind::Blog]))
            .await
            .unwrap();

        assert!(!blog.uploaded()[0].0.exists());
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_image_fails_every_platform_without_dispatch() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("not-an-image.png");
        std::fs::write(&bogus, b"definitely not a png").unwrap();

        let blog = Arc::new(MockPublisher::success(PlatformKind::Blog));
        let workflow = workflow(dir.path(), false, quick_manager().with_publisher(blog.clone()));

        let report = workflow
            .run(PublishRequest::new(&bogus, "hi", [PlatformKind::Blog]))
            .await
            .unwrap();

        let result = report.get(PlatformKind::Blog).unwrap();
        assert!(!result.success);
        assert!(result.attempts.is_empty());
        assert!(result.detail.contains("Image processing error"));
        assert_eq!(blog.upload_call_count(), 0);
    }
}
