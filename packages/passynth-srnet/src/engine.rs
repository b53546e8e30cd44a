use std::path::PathBuf;

use async_trait::async_trait;
use image::RgbImage;
use thiserror::Error;

/// A style reference crop paired with the skeleton text that should inherit its look.
#[derive(Debug, Clone)]
pub struct StyleInput {
    pub style: RgbImage,
    pub skeleton: RgbImage,
}

impl StyleInput {
    pub fn new(style: RgbImage, skeleton: RgbImage) -> Result<Self, StyleError> {
        if style.dimensions() != skeleton.dimensions() {
            return Err(StyleError::InvalidInput(format!(
                "style image is {:?} but skeleton is {:?}",
                style.dimensions(),
                skeleton.dimensions()
            )));
        }
        if style.width() == 0 || style.height() == 0 {
            return Err(StyleError::InvalidInput("empty image".into()));
        }
        Ok(Self { style, skeleton })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.style.dimensions()
    }
}

#[derive(Debug, Clone)]
pub struct StyleOutput {
    /// Styled text fused onto the reference background, same size as the input.
    pub fused: RgbImage,
}

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("model not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("engine error: {0}")]
    EngineError(String),
}

#[async_trait]
pub trait StyleTransferEngine: Send + Sync {
    async fn transfer(&self, input: &StyleInput) -> Result<StyleOutput, StyleError>;
}
