//! Image decoding for the classifier pipeline.
//!
//! A thin wrapper around the `image` crate: decode bytes of any supported
//! format, stretch them to an exact target geometry and hand back interleaved
//! 8-bit RGB with any alpha channel dropped.
//!
//! All decoded images use HWC layout: `[height, width, 3]`.

pub mod error;
pub mod filter;
pub mod image;

pub use error::ImageError;
pub use filter::ResizeFilter;
pub use image::Image;

fn decode_rgb_inner(
    data: &[u8],
    width: usize,
    height: usize,
    filter: ResizeFilter,
) -> Result<Image, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::Resize(format!(
            "target geometry must be non-zero, got {width}x{height}"
        )));
    }
    let (target_w, target_h) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(ImageError::Resize(format!(
                "target geometry {width}x{height} is too large"
            )));
        }
    };

    let img = crates_image::load_from_memory(data)?;

    // stretch, no aspect ratio preservation
    let img = if img.width() == target_w && img.height() == target_h {
        img
    } else {
        img.resize_exact(target_w, target_h, filter.filter_type())
    };

    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    Ok(Image::from_rgb8(w as usize, h as usize, rgb.into_raw())?)
}

/// Decodes image bytes and stretches them to exactly `width` x `height` RGB pixels.
///
/// The format is auto-detected by the `image` crate. Alpha is discarded, not
/// composited. Grayscale and 16-bit inputs are converted to 8-bit RGB.
///
/// The CPU-bound work runs on tokio's blocking thread pool.
///
/// # Errors
///
/// Returns `ImageError::Decode` if the data is invalid or the format is unsupported.
/// Returns `ImageError::Resize` if the target geometry is zero or does not fit in `u32`.
/// Returns `ImageError::Worker` if the blocking task itself fails.
pub async fn decode_rgb(
    data: &[u8],
    width: usize,
    height: usize,
    filter: ResizeFilter,
) -> Result<Image, ImageError> {
    let owned = data.to_vec();
    tokio::task::spawn_blocking(move || decode_rgb_inner(&owned, width, height, filter))
        .await
        .map_err(|e| ImageError::Worker(e.to_string()))?
}
