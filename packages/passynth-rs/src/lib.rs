//! # passynth-rs
//!
//! Generates synthetic passport images for training document recognition models. Every labeled
//! text field of an annotated scan is replaced by freshly generated content that keeps the look
//! of the original print.
//!
//! ## Pipeline
//!
//! - **Annotations**: labelme-style JSON next to each image lists the labeled rectangles
//! - **Regions**: fields are cropped, vertical ones turned to read horizontally
//! - **Content**: one consistent synthetic passport holder per generated image
//! - **Skeletons**: the new text is drawn in black on neutral gray at the field's pixel size
//! - **Style transfer**: an SRNet engine blends the skeleton with the original field's style
//! - **Compositing**: the styled field is pasted back and the image saved under a timestamp
//!
//! ## Quick Start
//!
//! ```ignore
//! use passynth_rs::prelude::*;
//! use passynth_srnet::{Device, OnnxSrnetEngine};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(OnnxSrnetEngine::from_path("model/final.onnx", Device::Cpu)?);
//! let renderer = Arc::new(FontSkeletonRenderer::from_path("arial.ttf".as_ref()).await?);
//!
//! let mut transformer = PassportTransformer::new(TransformOptions::default(), engine, renderer);
//! let result = transformer.transform_all().await?;
//! println!("wrote {} images", result.outputs.len());
//! ```

pub mod annotation;
pub mod content;
pub mod logging;
pub mod region;
pub mod skeleton;
pub mod transformer;

// Re-export commonly used types at the root level
pub use annotation::{annotation_path_for, Annotation, PixelRect, Shape};
pub use content::{generate_contents, Gender, PassportContent, PassportField, UnknownFieldError};
pub use region::{extract_region, paste_region, restore_orientation, Orientation};
pub use skeleton::{FontSkeletonRenderer, SkeletonRenderer};
pub use transformer::{ImageResult, PassportTransformer, ShapeOutcome, TransformOptions, TransformResult};

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```ignore
/// use passynth_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        annotation_path_for, extract_region, generate_contents, paste_region, restore_orientation,
        Annotation, FontSkeletonRenderer, Gender, ImageResult, Orientation, PassportContent,
        PassportField, PassportTransformer, PixelRect, ShapeOutcome, Shape, SkeletonRenderer,
        TransformOptions, TransformResult,
    };
}
