pub mod engine;
pub mod onnx;
pub mod passthrough;
pub mod tensor;

pub use engine::{StyleError, StyleInput, StyleOutput, StyleTransferEngine};
pub use onnx::{Device, OnnxSrnetConfig, OnnxSrnetEngine};
pub use passthrough::PassthroughEngine;
pub use tensor::TensorLayout;
