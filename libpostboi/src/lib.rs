//! Postboi - publish one image to many platforms at once
//!
//! This library adjusts an image and caption for each destination, posts
//! them concurrently with per-platform retries, and reports what happened.

pub mod adjust;
pub mod config;
pub mod error;
pub mod logging;
pub mod platforms;
pub mod retry;
pub mod share;
pub mod types;
pub mod workflow;

// Re-export commonly used types
pub use config::Config;
pub use error::{PostboiError, Result};
pub use retry::RetryPolicy;
pub use share::{ShareJob, ShareManager};
pub use types::{
    AttemptRecord, ConnectionStatus, PlatformKind, PlatformResult, PublishRequest, WorkflowReport,
};
pub use workflow::{summarize, Workflow};
