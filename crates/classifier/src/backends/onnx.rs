use {
    crate::{
        error::{ClassifyError, Result},
        session::{Backend, Dim, InputInfo, Session},
    },
    base::Tensor,
    ndarray::{ArrayViewD, IxDyn},
    ort::{
        session::{Session as OrtSession, builder::GraphOptimizationLevel},
        value::{TensorRef, ValueType},
    },
    std::{collections::HashMap, fmt, path::Path, sync::OnceLock, time::Instant},
};

static ORT_INIT: OnceLock<()> = OnceLock::new();

fn ensure_ort_init() {
    ORT_INIT.get_or_init(|| {
        let _ = ort::init().with_name("classifier").commit();
    });
}

/// ONNX Runtime backend, CPU execution provider.
#[derive(Clone, Debug, Default)]
pub struct OnnxBackend {
    intra_threads: Option<usize>,
}

impl OnnxBackend {
    pub fn new(intra_threads: Option<usize>) -> Self {
        Self { intra_threads }
    }
}

fn load_error<E: fmt::Display>(context: &'static str) -> impl Fn(E) -> ClassifyError {
    move |e| ClassifyError::ModelLoad(format!("{context}: {e}"))
}

impl Backend for OnnxBackend {
    fn name(&self) -> &str {
        "onnx"
    }

    fn load_model(&self, path: &Path) -> Result<Box<dyn Session>> {
        if !path.is_file() {
            return Err(ClassifyError::ModelLoad(format!(
                "model file not found: {}",
                path.display()
            )));
        }
        ensure_ort_init();
        let start = Instant::now();

        let mut builder = OrtSession::builder()
            .map_err(load_error("failed to create session builder"))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_error("failed to set optimization level"))?;
        if let Some(threads) = self.intra_threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(load_error("failed to set intra-op threads"))?;
        }
        let session = builder
            .commit_from_file(path)
            .map_err(load_error("failed to load model"))?;

        let inputs: Vec<InputInfo> = session
            .inputs()
            .iter()
            .map(|input| InputInfo::new(input.name(), declared_dims(input.dtype())))
            .collect();
        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|output| output.name().to_string())
            .collect();
        let metadata = read_custom_metadata(&session);

        log::debug!(
            "onnx session for {} ready in {:?}: inputs {:?}, outputs {:?}, {} metadata entries",
            path.display(),
            start.elapsed(),
            inputs,
            output_names,
            metadata.len()
        );

        Ok(Box::new(OnnxSession {
            session,
            inputs,
            output_names,
            metadata,
        }))
    }
}

fn declared_dims(value_type: &ValueType) -> Option<Vec<Dim>> {
    match value_type {
        ValueType::Tensor { shape, .. } => Some(shape.iter().map(|&d| Dim::from(d)).collect()),
        _ => None,
    }
}

/// Missing or unreadable metadata is an empty map.
fn read_custom_metadata(session: &OrtSession) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let metadata = match session.metadata() {
        Ok(metadata) => metadata,
        Err(e) => {
            log::debug!("model metadata unavailable: {}", e);
            return map;
        }
    };
    let keys = match metadata.custom_keys() {
        Ok(keys) => keys,
        Err(e) => {
            log::debug!("model metadata keys unavailable: {}", e);
            return map;
        }
    };
    for key in keys {
        if let Some(value) = metadata.custom(&key) {
            map.insert(key, value);
        }
    }
    map
}

pub struct OnnxSession {
    session: OrtSession,
    inputs: Vec<InputInfo>,
    output_names: Vec<String>,
    metadata: HashMap<String, String>,
}

impl Session for OnnxSession {
    fn inputs(&self) -> &[InputInfo] {
        &self.inputs
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }

    fn custom_metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    fn run(&mut self, input_name: &str, input: &Tensor<f32>) -> Result<Tensor<f32>> {
        if !self.inputs.iter().any(|i| i.name == input_name) {
            return Err(ClassifyError::Config(format!(
                "model has no input named '{}'",
                input_name
            )));
        }

        let view = ArrayViewD::from_shape(IxDyn(input.shape()), input.data())
            .map_err(|e| ClassifyError::Runtime(format!("failed to view input tensor: {}", e)))?;
        let tensor_ref = TensorRef::from_array_view(view)
            .map_err(|e| ClassifyError::Runtime(format!("failed to create tensor ref: {}", e)))?;

        let outputs = self
            .session
            .run(ort::inputs![input_name => tensor_ref])
            .map_err(|e| ClassifyError::Runtime(format!("session run failed: {}", e)))?;

        let name = self
            .output_names
            .first()
            .ok_or_else(|| ClassifyError::Runtime("model declares no outputs".to_string()))?;
        let value = outputs
            .get(name.as_str())
            .ok_or_else(|| ClassifyError::Runtime(format!("output '{}' missing from results", name)))?;
        let (shape, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifyError::Runtime(format!("output '{}' is not f32: {}", name, e)))?;
        let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        Ok(Tensor::new(shape, data.to_vec())?)
    }
}
