//! Conversions between RGB crops and the normalised tensors SRNet consumes.
//!
//! SRNet is trained on text crops 64 pixels tall whose width is a multiple of 8. Pixels live
//! in `[-1, 1]` on the way in and come back in the same range.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::{Array4, ArrayViewD};

use crate::engine::StyleError;

/// Height every crop is resized to before inference.
pub const MODEL_HEIGHT: u32 = 64;

/// Model widths are rounded to a multiple of this.
pub const WIDTH_STEP: u32 = 8;

/// Memory layout of the image tensors the exported graph expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `[batch, height, width, channels]`, the layout of the original TensorFlow graph.
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]`
    Nchw,
}

/// Returns the `(width, height)` a crop of the given size is resized to for inference.
pub fn model_size(width: u32, height: u32) -> (u32, u32) {
    let scaled = MODEL_HEIGHT as f32 * width as f32 / height.max(1) as f32;
    let steps = (scaled / WIDTH_STEP as f32).round() as u32;
    ((steps * WIDTH_STEP).max(WIDTH_STEP), MODEL_HEIGHT)
}

pub fn normalize(value: u8) -> f32 {
    value as f32 / 127.5 - 1.0
}

pub fn denormalize(value: f32) -> u8 {
    ((value + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8
}

/// Resizes `image` to `size` and packs it into a batch-1 tensor.
pub fn to_tensor(image: &RgbImage, size: (u32, u32), layout: TensorLayout) -> Array4<f32> {
    let (width, height) = size;
    let resized = if image.dimensions() == size {
        image.clone()
    } else {
        imageops::resize(image, width, height, FilterType::Triangle)
    };

    let (w, h) = (width as usize, height as usize);
    let mut tensor = match layout {
        TensorLayout::Nhwc => Array4::<f32>::zeros((1, h, w, 3)),
        TensorLayout::Nchw => Array4::<f32>::zeros((1, 3, h, w)),
    };
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let value = normalize(pixel[c]);
            match layout {
                TensorLayout::Nhwc => tensor[[0, y, x, c]] = value,
                TensorLayout::Nchw => tensor[[0, c, y, x]] = value,
            }
        }
    }
    tensor
}

/// Unpacks the first image of a model output tensor.
pub fn from_tensor(tensor: &ArrayViewD<'_, f32>, layout: TensorLayout) -> Result<RgbImage, StyleError> {
    let shape = tensor.shape();
    if shape.len() != 4 || shape[0] == 0 {
        return Err(StyleError::EngineError(format!(
            "unexpected output shape {:?}",
            shape
        )));
    }
    let (height, width, channels) = match layout {
        TensorLayout::Nhwc => (shape[1], shape[2], shape[3]),
        TensorLayout::Nchw => (shape[2], shape[3], shape[1]),
    };
    if channels != 3 {
        return Err(StyleError::EngineError(format!(
            "expected 3 output channels, got {} (shape {:?})",
            channels, shape
        )));
    }

    let mut image = RgbImage::new(width as u32, height as u32);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let (x, y) = (x as usize, y as usize);
        let mut rgb = [0u8; 3];
        for (c, value) in rgb.iter_mut().enumerate() {
            let raw = match layout {
                TensorLayout::Nhwc => tensor[[0, y, x, c]],
                TensorLayout::Nchw => tensor[[0, c, y, x]],
            };
            *value = denormalize(raw);
        }
        *pixel = Rgb(rgb);
    }
    Ok(image)
}

/// Scales a model output back to the size of the crop it replaces.
pub fn restore_size(image: RgbImage, size: (u32, u32)) -> RgbImage {
    if image.dimensions() == size {
        image
    } else {
        imageops::resize(&image, size.0, size.1, FilterType::Triangle)
    }
}
