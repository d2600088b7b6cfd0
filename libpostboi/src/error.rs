//! Error types for Postboi

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PostboiError>;

#[derive(Error, Debug)]
pub enum PostboiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Image processing error: {0}")]
    Image(#[from] ImageProcessingError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PostboiError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PostboiError::InvalidInput(_) => 3,
            PostboiError::Platform(PlatformError::Authentication(_)) => 2,
            PostboiError::Platform(_) => 1,
            PostboiError::Config(_) => 1,
            PostboiError::Image(_) => 1,
        }
    }

    /// Whether another publish attempt could plausibly succeed.
    ///
    /// Remote failures retry. Local setup problems (bad settings, unreadable
    /// images, malformed requests) never do.
    pub fn is_retryable(&self) -> bool {
        match self {
            PostboiError::Platform(platform_error) => platform_error.is_retryable(),
            PostboiError::Config(_) | PostboiError::Image(_) | PostboiError::InvalidInput(_) => {
                false
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ImageProcessingError {
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode adjusted image {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Image I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image {path} is too large: {size_bytes} bytes, limit is {limit_bytes}")]
    TooLarge {
        path: String,
        size_bytes: u64,
        limit_bytes: u64,
    },
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Publisher misconfigured: {0}")]
    Configuration(String),
}

impl PlatformError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PlatformError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = PostboiError::InvalidInput("No platforms selected".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_authentication_error() {
        let error = PostboiError::Platform(PlatformError::Authentication("bad token".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_errors() {
        let posting = PostboiError::Platform(PlatformError::Posting("boom".to_string()));
        let config =
            PostboiError::Config(ConfigError::MissingField("wordpress.site_url".to_string()));
        let image = PostboiError::Image(ImageProcessingError::Io {
            path: "/nope.jpg".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        });

        assert_eq!(posting.exit_code(), 1);
        assert_eq!(config.exit_code(), 1);
        assert_eq!(image.exit_code(), 1);
    }

    #[test]
    fn test_remote_failures_are_retryable() {
        for error in [
            PlatformError::Authentication("a".to_string()),
            PlatformError::Validation("v".to_string()),
            PlatformError::Posting("p".to_string()),
            PlatformError::Network("n".to_string()),
            PlatformError::RateLimit("r".to_string()),
        ] {
            assert!(PostboiError::from(error).is_retryable());
        }
    }

    #[test]
    fn test_setup_failures_are_not_retryable() {
        let misconfigured = PostboiError::from(PlatformError::Configuration("no url".to_string()));
        assert!(!misconfigured.is_retryable());

        let invalid = PostboiError::InvalidInput("empty".to_string());
        assert!(!invalid.is_retryable());

        let config = PostboiError::from(ConfigError::MissingField("x".to_string()));
        assert!(!config.is_retryable());
    }

    #[test]
    fn test_error_message_formatting() {
        let error =
            PostboiError::Platform(PlatformError::Network("Connection refused".to_string()));
        assert_eq!(
            error.to_string(),
            "Platform error: Network error: Connection refused"
        );

        let error = PostboiError::Config(ConfigError::Invalid {
            field: "workflow.max_workers".to_string(),
            reason: "must be at least 1".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid value for workflow.max_workers: must be at least 1"
        );
    }

    #[test]
    fn test_platform_error_clone() {
        let original = PlatformError::RateLimit("slow down".to_string());
        let cloned = original.clone();
        assert_eq!(original.to_string(), cloned.to_string());
    }
}
