//! Cropping labeled fields out of a scan and writing replacements back.
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::annotation::PixelRect;

/// How the text of a field runs on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    /// Text printed top-to-bottom, such as the series and number along a passport's edge.
    Vertical,
}

/// Crops `rect` out of `image`, turning vertical fields so their text reads left to right.
///
/// Returns `None` when the rectangle lies outside the image.
pub fn extract_region(image: &RgbImage, rect: PixelRect, orientation: Orientation) -> Option<RgbImage> {
    let rect = rect.clamp_to(image.width(), image.height())?;
    let crop = imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();
    Some(match orientation {
        Orientation::Horizontal => crop,
        // 90 degrees counter-clockwise
        Orientation::Vertical => imageops::rotate270(&crop),
    })
}

/// Undoes the rotation applied by [`extract_region`].
pub fn restore_orientation(region: RgbImage, orientation: Orientation) -> RgbImage {
    match orientation {
        Orientation::Horizontal => region,
        Orientation::Vertical => imageops::rotate90(&region),
    }
}

/// Writes `patch` into `canvas` with its top-left corner at `rect`'s origin.
///
/// A patch whose size differs from `rect` is resized to fit first; anything past the canvas
/// edge is dropped.
pub fn paste_region(canvas: &mut RgbImage, patch: &RgbImage, rect: PixelRect) {
    let resized;
    let patch = if patch.dimensions() == (rect.width, rect.height) {
        patch
    } else {
        resized = imageops::resize(patch, rect.width, rect.height, FilterType::Triangle);
        &resized
    };
    imageops::replace(canvas, patch, rect.x as i64, rect.y as i64);
}
