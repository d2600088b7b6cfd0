//! Image adjustment: orientation, fit-within resize and JPEG normalization

use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::error::{ParameterError, ParameterErrorKind};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader};
use tracing::{debug, warn};

use super::PlatformAdjustment;
use crate::error::{ImageProcessingError, Result};
use crate::types::PlatformKind;

/// JPEG quality of adjusted copies
const JPEG_QUALITY: u8 = 85;

/// JPEG frame headers store each dimension in 16 bits
const JPEG_MAX_DIMENSION: u32 = u16::MAX as u32;

/// A platform-specific copy of the source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustedImage {
    pub path: PathBuf,
    /// Source size after EXIF orientation is applied
    pub original_dimensions: (u32, u32),
    pub dimensions: (u32, u32),
}

impl AdjustedImage {
    pub fn was_resized(&self) -> bool {
        self.original_dimensions != self.dimensions
    }
}

/// Whether `path` names an `http(s)` URL rather than a local file
pub fn is_remote(path: &Path) -> bool {
    let raw = path.to_string_lossy();
    raw.starts_with("http://") || raw.starts_with("https://")
}

/// Reject a source file larger than `max_bytes`. Returns the file size.
pub fn check_file_size(path: &Path, max_bytes: u64) -> Result<u64> {
    let size_bytes = fs::metadata(path)
        .map_err(|source| ImageProcessingError::Io {
            path: path.display().to_string(),
            source,
        })?
        .len();

    if size_bytes > max_bytes {
        return Err(ImageProcessingError::TooLarge {
            path: path.display().to_string(),
            size_bytes,
            limit_bytes: max_bytes,
        }
        .into());
    }
    Ok(size_bytes)
}

/// Largest size that fits `(width, height)` inside `target` with the same
/// aspect ratio. Never scales up.
pub fn fit_within(width: u32, height: u32, target: (u32, u32)) -> (u32, u32) {
    let (max_w, max_h) = target;
    if width <= max_w && height <= max_h {
        return (width, height);
    }

    let scale = f64::min(max_w as f64 / width as f64, max_h as f64 / height as f64);
    let new_w = ((width as f64 * scale).round() as u32).clamp(1, max_w);
    let new_h = ((height as f64 * scale).round() as u32).clamp(1, max_h);
    (new_w, new_h)
}

/// Write a copy of `image_path` sized and encoded for `platform`.
///
/// The EXIF orientation tag is applied before sizing, so a portrait photo
/// stored sideways comes out upright. The copy lands in `work_dir` under a
/// name unique to this call, so concurrent adjustments never collide. The
/// source file is only read.
///
/// # Errors
///
/// Returns `ImageProcessingError` if the source cannot be read or decoded,
/// or the copy cannot be written.
pub fn adjust_image(
    image_path: &Path,
    platform: PlatformKind,
    work_dir: &Path,
) -> Result<AdjustedImage> {
    let source = open_oriented(image_path)?;

    let original_dimensions = (source.width(), source.height());
    let dimensions = match PlatformAdjustment::for_platform(platform).target_dimensions {
        Some(target) => fit_within(original_dimensions.0, original_dimensions.1, target),
        None => original_dimensions,
    };

    let resized = if dimensions == original_dimensions {
        source
    } else {
        source.resize_exact(dimensions.0, dimensions.1, FilterType::Lanczos3)
    };

    let path = work_dir.join(format!(
        "postboi-{}-{}.jpg",
        platform.as_str(),
        uuid::Uuid::new_v4()
    ));
    write_jpeg(&resized, &path)?;

    debug!(
        platform = %platform,
        from = ?original_dimensions,
        to = ?dimensions,
        path = %path.display(),
        "Adjusted image"
    );

    Ok(AdjustedImage {
        path,
        original_dimensions,
        dimensions,
    })
}

/// Decode `path` and rotate or flip it as its EXIF orientation says
fn open_oriented(path: &Path) -> Result<DynamicImage> {
    let io_error = |source| ImageProcessingError::Io {
        path: path.display().to_string(),
        source,
    };
    let decode_error = |source| ImageProcessingError::Decode {
        path: path.display().to_string(),
        source,
    };

    let reader = ImageReader::open(path)
        .map_err(io_error)?
        .with_guessed_format()
        .map_err(io_error)?;
    let mut decoder = reader.into_decoder().map_err(decode_error)?;
    let orientation = decoder.orientation().map_err(decode_error)?;

    let mut image = DynamicImage::from_decoder(decoder).map_err(decode_error)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Encode in memory first so a failed encode never leaves a file behind
fn write_jpeg(image: &DynamicImage, path: &Path) -> Result<()> {
    let encode_error = |source| ImageProcessingError::Encode {
        path: path.display().to_string(),
        source,
    };

    if image.width() > JPEG_MAX_DIMENSION || image.height() > JPEG_MAX_DIMENSION {
        return Err(encode_error(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        )))
        .into());
    }

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut bytes = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY))
        .map_err(encode_error)?;

    if let Err(source) = fs::write(path, &bytes) {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to remove partial image");
            }
        }
        return Err(ImageProcessingError::Io {
            path: path.display().to_string(),
            source,
        }
        .into());
    }
    Ok(())
}
