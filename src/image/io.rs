//! Convenience helpers for loading and saving planes via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{ImageView, OwnedImage};
use crate::util::{GckMatchError, GckMatchResult};
use std::path::Path;

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &image::GrayImage) -> GckMatchResult<ImageView<'_, u8>> {
    ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Loads an image from disk and converts it to a grayscale plane.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> GckMatchResult<OwnedImage> {
    let img = image::open(path).map_err(|err| GckMatchError::ImageIo {
        reason: err.to_string(),
    })?;
    let gray = img.to_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    OwnedImage::new(gray.into_raw(), width, height)
}

/// Writes a grayscale plane to disk; the format follows the file extension.
pub fn save_gray_image<P: AsRef<Path>>(path: P, img: &OwnedImage) -> GckMatchResult<()> {
    let width = u32::try_from(img.width()).map_err(|_| GckMatchError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    let height = u32::try_from(img.height()).map_err(|_| GckMatchError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    let buffer = image::GrayImage::from_raw(width, height, img.data().to_vec()).ok_or(
        GckMatchError::BufferTooSmall {
            needed: img.width() * img.height(),
            got: img.data().len(),
        },
    )?;
    buffer.save(path).map_err(|err| GckMatchError::ImageIo {
        reason: err.to_string(),
    })
}
