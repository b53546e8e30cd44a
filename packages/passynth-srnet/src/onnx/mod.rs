mod engine;

pub use engine::{Device, OnnxSrnetConfig, OnnxSrnetEngine};
