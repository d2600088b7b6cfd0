//! Per-platform content adjustment
//!
//! Turns the canonical caption and image into versions each platform will
//! accept. Adjustment degrades (truncates, drops hashtags, shrinks) instead of
//! failing; the only errors are an image that is too large, cannot be decoded
//! or cannot be written.

use crate::types::PlatformKind;

pub mod caption;
pub mod media;

pub use caption::{adjust_caption, hashtags};
pub use media::{adjust_image, check_file_size, fit_within, is_remote, AdjustedImage};

/// Static constraints of one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformAdjustment {
    /// Maximum caption length in characters; `None` means unlimited
    pub max_caption_length: Option<usize>,
    /// Maximum number of hashtags; `None` means unlimited
    pub max_hashtags: Option<usize>,
    /// Box (width, height) the image must fit in; `None` keeps the original size
    pub target_dimensions: Option<(u32, u32)>,
    /// The platform fetches images itself, so an `http(s)` URL can be posted as-is
    pub accepts_image_url: bool,
}

const BLOG: PlatformAdjustment = PlatformAdjustment {
    max_caption_length: None,
    max_hashtags: None,
    target_dimensions: Some((1920, 1920)),
    accepts_image_url: false,
};

const PAGE: PlatformAdjustment = PlatformAdjustment {
    max_caption_length: Some(63_206),
    max_hashtags: None,
    target_dimensions: Some((2048, 2048)),
    accepts_image_url: false,
};

const BUSINESS_ACCOUNT: PlatformAdjustment = PlatformAdjustment {
    max_caption_length: Some(2_200),
    max_hashtags: Some(30),
    target_dimensions: Some((1080, 1350)),
    accepts_image_url: true,
};

impl PlatformAdjustment {
    pub fn for_platform(platform: PlatformKind) -> &'static PlatformAdjustment {
        match platform {
            PlatformKind::Blog => &BLOG,
            PlatformKind::Page => &PAGE,
            PlatformKind::BusinessAccount => &BUSINESS_ACCOUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_account_limits() {
        let adjustment = PlatformAdjustment::for_platform(PlatformKind::BusinessAccount);
        assert_eq!(adjustment.max_caption_length, Some(2200));
        assert_eq!(adjustment.max_hashtags, Some(30));
    }

    #[test]
    fn test_only_business_account_limits_hashtags() {
        assert!(PlatformAdjustment::for_platform(PlatformKind::Blog).max_hashtags.is_none());
        assert!(PlatformAdjustment::for_platform(PlatformKind::Page).max_hashtags.is_none());
    }

    #[test]
    fn test_blog_caption_unlimited() {
        assert!(PlatformAdjustment::for_platform(PlatformKind::Blog)
            .max_caption_length
            .is_none());
    }

    #[test]
    fn test_page_limit_larger_than_business_account() {
        let page = PlatformAdjustment::for_platform(PlatformKind::Page);
        let business = PlatformAdjustment::for_platform(PlatformKind::BusinessAccount);
        assert!(page.max_caption_length.unwrap() > business.max_caption_length.unwrap());
    }

    #[test]
    fn test_only_business_account_takes_image_urls() {
        let accepting: Vec<_> = PlatformKind::ALL
            .into_iter()
            .filter(|&p| PlatformAdjustment::for_platform(p).accepts_image_url)
            .collect();
        assert_eq!(accepting, vec![PlatformKind::BusinessAccount]);
    }
}
