use async_trait::async_trait;

use crate::engine::{StyleInput, StyleOutput, StyleError, StyleTransferEngine};

/// Engine that skips style transfer and hands back the skeleton text as-is.
///
/// Handy for checking annotation geometry and font coverage before a model is available.
pub struct PassthroughEngine;

impl PassthroughEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PassthroughEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StyleTransferEngine for PassthroughEngine {
    async fn transfer(&self, input: &StyleInput) -> Result<StyleOutput, StyleError> {
        Ok(StyleOutput {
            fused: input.skeleton.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[tokio::test]
    async fn test_passthrough_returns_skeleton() {
        let style = RgbImage::from_pixel(12, 6, Rgb([200, 10, 10]));
        let skeleton = RgbImage::from_pixel(12, 6, Rgb([127, 127, 127]));
        let input = StyleInput::new(style, skeleton.clone()).unwrap();

        let output = PassthroughEngine::new().transfer(&input).await.unwrap();
        assert_eq!(output.fused, skeleton);
    }
}
