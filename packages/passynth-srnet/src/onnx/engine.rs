use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info, warn};

use crate::engine::{StyleError, StyleInput, StyleOutput, StyleTransferEngine};
use crate::tensor::{from_tensor, model_size, restore_size, to_tensor, TensorLayout};

/// Where inference runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Cuda(i32),
}

impl Device {
    /// Maps a `--gpu` style index to a device; any negative index selects the CPU.
    pub fn from_gpu_index(index: i32) -> Self {
        if index < 0 {
            Device::Cpu
        } else {
            Device::Cuda(index)
        }
    }
}

/// Settings for loading an SRNet graph exported to ONNX.
#[derive(Debug, Clone)]
pub struct OnnxSrnetConfig {
    pub model_path: PathBuf,
    pub device: Device,
    pub layout: TensorLayout,
    /// Input fed with the skeleton text (`i_t`).
    pub text_input: String,
    /// Input fed with the style reference crop (`i_s`).
    pub style_input: String,
    /// Output holding the fused result (`o_f`). The last graph output when unset.
    pub fused_output: Option<String>,
    pub intra_threads: usize,
}

impl Default for OnnxSrnetConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./model/final.onnx"),
            device: Device::Cpu,
            layout: TensorLayout::Nhwc,
            text_input: "i_t".to_string(),
            style_input: "i_s".to_string(),
            fused_output: None,
            intra_threads: 4,
        }
    }
}

#[derive(Debug, Clone)]
struct TensorNames {
    text_input: String,
    style_input: String,
    fused_output: String,
}

/// SRNet inference through ONNX Runtime. The session is created once and shared.
#[derive(Clone)]
pub struct OnnxSrnetEngine {
    session: Arc<Mutex<Session>>,
    names: TensorNames,
    layout: TensorLayout,
}

impl std::fmt::Debug for OnnxSrnetEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSrnetEngine")
            .field("names", &self.names)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

fn engine_error(err: impl std::fmt::Display) -> StyleError {
    StyleError::EngineError(err.to_string())
}

impl OnnxSrnetEngine {
    pub fn new(config: OnnxSrnetConfig) -> Result<Self, StyleError> {
        if !config.model_path.exists() {
            return Err(StyleError::ModelNotFound(config.model_path));
        }

        info!("Loading SRNet model from {}", config.model_path.display());

        let mut providers: Vec<ExecutionProviderDispatch> = Vec::new();
        if let Device::Cuda(device_id) = config.device {
            providers.push(CUDAExecutionProvider::default().with_device_id(device_id).build());
        }
        providers.push(CPUExecutionProvider::default().build());

        let session = Session::builder()
            .map_err(engine_error)?
            .with_execution_providers(providers)
            .map_err(engine_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(engine_error)?
            .with_intra_threads(config.intra_threads.max(1))
            .map_err(engine_error)?
            .commit_from_file(&config.model_path)
            .map_err(|e| {
                StyleError::EngineError(format!(
                    "failed to load {}: {}",
                    config.model_path.display(),
                    e
                ))
            })?;

        let names = resolve_names(&session, &config)?;
        debug!(
            "SRNet inputs: text={}, style={}; output: {}",
            names.text_input, names.style_input, names.fused_output
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            names,
            layout: config.layout,
        })
    }

    /// Loads a model with default settings on the given device.
    pub fn from_path(model_path: impl AsRef<Path>, device: Device) -> Result<Self, StyleError> {
        Self::new(OnnxSrnetConfig {
            model_path: model_path.as_ref().to_path_buf(),
            device,
            ..Default::default()
        })
    }
}

fn resolve_names(session: &Session, config: &OnnxSrnetConfig) -> Result<TensorNames, StyleError> {
    let inputs: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
    let outputs: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();

    let (text_input, style_input) =
        if inputs.contains(&config.text_input.as_str()) && inputs.contains(&config.style_input.as_str()) {
            (config.text_input.clone(), config.style_input.clone())
        } else if inputs.len() == 2 {
            warn!(
                "model inputs {:?} do not match {}/{}, using positional order",
                inputs, config.text_input, config.style_input
            );
            (inputs[0].to_string(), inputs[1].to_string())
        } else {
            return Err(StyleError::EngineError(format!(
                "expected inputs {} and {}, model has {:?}",
                config.text_input, config.style_input, inputs
            )));
        };

    let fused_output = match &config.fused_output {
        Some(name) if outputs.contains(&name.as_str()) => name.clone(),
        Some(name) => {
            return Err(StyleError::EngineError(format!(
                "output {} not found, model has {:?}",
                name, outputs
            )))
        }
        None => outputs
            .last()
            .map(|name| name.to_string())
            .ok_or_else(|| StyleError::EngineError("model has no outputs".into()))?,
    };

    Ok(TensorNames {
        text_input,
        style_input,
        fused_output,
    })
}

fn run_inference(
    session: &Mutex<Session>,
    names: &TensorNames,
    layout: TensorLayout,
    input: &StyleInput,
) -> Result<StyleOutput, StyleError> {
    let (width, height) = input.dimensions();
    let target = model_size(width, height);

    let text = Value::from_array(to_tensor(&input.skeleton, target, layout)).map_err(engine_error)?;
    let style = Value::from_array(to_tensor(&input.style, target, layout)).map_err(engine_error)?;

    let mut session = session
        .lock()
        .map_err(|_| StyleError::EngineError("session lock poisoned".into()))?;
    let outputs = session
        .run(ort::inputs![
            names.text_input.as_str() => text,
            names.style_input.as_str() => style
        ])
        .map_err(engine_error)?;

    let fused = outputs[names.fused_output.as_str()]
        .try_extract_array::<f32>()
        .map_err(engine_error)?;
    let image = from_tensor(&fused, layout)?;

    Ok(StyleOutput {
        fused: restore_size(image, (width, height)),
    })
}

#[async_trait]
impl StyleTransferEngine for OnnxSrnetEngine {
    async fn transfer(&self, input: &StyleInput) -> Result<StyleOutput, StyleError> {
        let session = Arc::clone(&self.session);
        let names = self.names.clone();
        let layout = self.layout;
        let input = input.clone();
        tokio::task::spawn_blocking(move || run_inference(&session, &names, layout, &input))
            .await
            .map_err(|e| StyleError::EngineError(e.to_string()))?
    }
}
