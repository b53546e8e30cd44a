//! Plain "skeleton" renderings of the replacement text, the structural input of SRNet.
use ab_glyph::{point, Font, FontVec, PxScale, Rect, ScaleFont};
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use std::path::Path;
use tokio::fs;

/// Neutral gray SRNet expects behind skeleton text.
pub const SKELETON_BACKGROUND: Rgb<u8> = Rgb([127, 127, 127]);

pub const SKELETON_TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Border around the text as a fraction of the smaller image side.
pub const DEFAULT_PADDING: f32 = 0.1;

const REFERENCE_SCALE: f32 = 100.0;

/// Rasterizes text into an image of an exact pixel size.
pub trait SkeletonRenderer: Send + Sync {
    fn render(&self, text: &str, width: u32, height: u32) -> RgbImage;
}

/// Skeleton renderer drawing with a TrueType/OpenType font.
pub struct FontSkeletonRenderer {
    font: FontVec,
    padding: f32,
}

impl FontSkeletonRenderer {
    pub fn new(font: FontVec) -> Self {
        Self {
            font,
            padding: DEFAULT_PADDING,
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = FontVec::try_from_vec(data).map_err(|e| anyhow!("Failed to parse font: {}", e))?;
        Ok(Self::new(font))
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .await
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        Self::from_bytes(data).with_context(|| format!("Invalid font {}", path.display()))
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding.clamp(0.0, 0.45);
        self
    }

    /// Pixel box covered by glyph outlines when `text` is drawn at `(0, 0)`.
    ///
    /// Follows the layout of `draw_text_mut`: the baseline sits at the font ascent and glyphs
    /// advance with kerning, so the box can be used to place the ink exactly.
    fn ink_bounds(&self, scale: f32, text: &str) -> Option<Rect> {
        let scale = PxScale::from(scale);
        let scaled = self.font.as_scaled(scale);
        let mut caret = 0.0f32;
        let mut last = None;
        let mut bounds: Option<Rect> = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            let glyph = id.with_scale_and_position(scale, point(caret, scaled.ascent()));
            caret += scaled.h_advance(id);
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            if let Some(prev) = last {
                caret += scaled.kern(id, prev);
            }
            last = Some(id);

            let bb = outlined.px_bounds();
            bounds = Some(match bounds {
                None => bb,
                Some(b) => Rect {
                    min: point(b.min.x.min(bb.min.x), b.min.y.min(bb.min.y)),
                    max: point(b.max.x.max(bb.max.x), b.max.y.max(bb.max.y)),
                },
            });
        }
        bounds
    }

    fn ink_size(&self, scale: f32, text: &str) -> (u32, u32) {
        self.ink_bounds(scale, text)
            .map(|b| (b.width().ceil() as u32, b.height().ceil() as u32))
            .unwrap_or((0, 0))
    }
}

/// Finds the largest font scale whose rendered extent fits into `target`.
///
/// `measure` returns the pixel extent of the text at a given scale.
fn fit_scale<F: Fn(f32) -> (u32, u32)>(measure: F, target: (u32, u32)) -> f32 {
    let (w0, h0) = measure(REFERENCE_SCALE);
    if w0 == 0 || h0 == 0 {
        return target.1.max(1) as f32;
    }
    let ratio = (target.0 as f32 / w0 as f32).min(target.1 as f32 / h0 as f32);
    let mut scale = (REFERENCE_SCALE * ratio).max(1.0);

    // Glyph extents are not perfectly linear in the scale; shrink until it fits.
    while scale > 1.0 {
        let (w, h) = measure(scale);
        if w <= target.0 && h <= target.1 {
            break;
        }
        scale = (scale * 0.95).max(1.0);
    }
    scale
}

impl SkeletonRenderer for FontSkeletonRenderer {
    fn render(&self, text: &str, width: u32, height: u32) -> RgbImage {
        let mut image = RgbImage::from_pixel(width, height, SKELETON_BACKGROUND);
        let text = text.trim();
        if text.is_empty() || width == 0 || height == 0 {
            return image;
        }

        let border = (width.min(height) as f32 * self.padding) as u32;
        let target = (width - 2 * border, height - 2 * border);

        let scale = fit_scale(|s| self.ink_size(s, text), target);
        let Some(ink) = self.ink_bounds(scale, text) else {
            return image;
        };

        // Center the ink box itself, not the line box: accents and descenders count.
        let ink_w = ink.width().ceil() as i32;
        let ink_h = ink.height().ceil() as i32;
        let x = (width as i32 - ink_w) / 2 - ink.min.x.round() as i32;
        let y = (height as i32 - ink_h) / 2 - ink.min.y.round() as i32;

        draw_text_mut(&mut image, SKELETON_TEXT_COLOR, x, y, scale, &self.font, text);
        image
    }
}
