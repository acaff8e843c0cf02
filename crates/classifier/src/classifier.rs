use {
    crate::{
        assets::{AssetLocator, AssetStore, FileStore},
        backends::OnnxBackend,
        config::ClassifierConfig,
        error::{ClassifyError, Result},
        labels::{self, ClassNames, LabelSources},
        postprocess::Prediction,
        preprocess::preprocess,
        session::{Backend, Session},
        shape::{self, InputGeometry},
    },
    base::Tensor,
    std::{
        collections::HashMap,
        path::{Path, PathBuf},
        sync::{Arc, Mutex},
        time::Instant,
    },
    tokio::sync::OnceCell,
};

/// The first declared input and the geometry read off its shape.
#[derive(Clone, Debug)]
struct ModelInput {
    name: String,
    geometry: InputGeometry,
}

/// A loaded model and everything read off it at load time.
struct LoadedModel {
    session: Mutex<Box<dyn Session>>,
    input: Option<ModelInput>,
    output_names: Vec<String>,
    metadata: HashMap<String, String>,
}

impl LoadedModel {
    fn load(backend: &dyn Backend, path: &Path, default_size: usize) -> Result<Self> {
        let session = backend.load_model(path)?;
        let input = session.inputs().first().map(|info| ModelInput {
            name: info.name.clone(),
            geometry: shape::inspect(&info.name, info.dims.as_deref(), default_size),
        });
        let output_names = session.output_names().to_vec();
        let metadata = session.custom_metadata().clone();
        Ok(Self {
            session: Mutex::new(session),
            input,
            output_names,
            metadata,
        })
    }

    /// Runs the session and returns the first output, flattened.
    fn run(&self, input_name: &str, tensor: &Tensor<f32>) -> Result<Vec<f32>> {
        if self.output_names.is_empty() {
            return Err(ClassifyError::Runtime("model declares no outputs".to_string()));
        }
        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifyError::Runtime("session lock poisoned".to_string()))?;
        Ok(session.run(input_name, tensor)?.into_data())
    }
}

/// Food / not-food image classifier.
///
/// The model and the class names are loaded on first use (or by
/// [`Classifier::warmup`]) and then kept for the lifetime of the value.
/// Concurrent first callers share a single load; a failed load is not cached,
/// so the next call tries again. A caller that stops waiting (a timeout, a
/// dropped request) does not cancel a load in flight.
pub struct Classifier {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClassifierConfig,
    backend: Arc<dyn Backend>,
    store: Arc<dyn AssetStore>,
    model_path: PathBuf,
    labels_path: PathBuf,
    model: OnceCell<Arc<LoadedModel>>,
    class_names: OnceCell<Arc<ClassNames>>,
}

impl Classifier {
    /// Classifier on ONNX Runtime reading assets from the filesystem.
    pub fn new(config: ClassifierConfig) -> Self {
        let backend = Arc::new(OnnxBackend::new(config.intra_threads()));
        Self::with_parts(config, backend, Arc::new(FileStore))
    }

    pub fn with_parts(config: ClassifierConfig, backend: Arc<dyn Backend>, store: Arc<dyn AssetStore>) -> Self {
        let locator = AssetLocator::from_process().with_extra_roots(config.asset_roots());
        let model_path = config
            .model_path()
            .cloned()
            .unwrap_or_else(|| locator.locate(config.model_file()));
        let labels_path = config
            .labels_path()
            .cloned()
            .unwrap_or_else(|| locator.locate(config.labels_file()));
        log::debug!(
            "classifier model {}, labels {}",
            model_path.display(),
            labels_path.display()
        );
        Self {
            inner: Arc::new(Inner {
                config,
                backend,
                store,
                model_path,
                labels_path,
                model: OnceCell::new(),
                class_names: OnceCell::new(),
            }),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.inner.config
    }

    pub fn model_path(&self) -> &Path {
        &self.inner.model_path
    }

    pub fn labels_path(&self) -> &Path {
        &self.inner.labels_path
    }

    /// True once both the model and the class names are loaded.
    pub fn is_ready(&self) -> bool {
        self.inner.model.initialized() && self.inner.class_names.initialized()
    }

    /// Resolved class names, if already loaded.
    pub fn class_names(&self) -> Option<Arc<ClassNames>> {
        self.inner.class_names.get().cloned()
    }

    /// Geometry images are resized to, if the model is loaded and has an input.
    pub fn input_geometry(&self) -> Option<InputGeometry> {
        self.inner.model.get()?.input.as_ref().map(|input| input.geometry)
    }

    /// Loads the model and resolves the class names now instead of on the
    /// first prediction.
    pub async fn warmup(&self) -> Result<()> {
        let start = Instant::now();
        let (model, names) = self.ensure_ready().await?;
        log::info!(
            "classifier warm in {:?}: input {:?}, outputs {:?}, {} classes from {}",
            start.elapsed(),
            model.input.as_ref().map(|input| &input.name),
            model.output_names,
            names.len(),
            names.origin()
        );
        Ok(())
    }

    /// Classifies one encoded image.
    ///
    /// # Errors
    ///
    /// - `ModelLoad` when the model cannot be loaded.
    /// - `Config` when the model declares no input.
    /// - `Decode` when `bytes` is not a decodable image.
    /// - `Runtime` when inference fails or yields no (or empty) output.
    pub async fn predict_from_buffer(&self, bytes: &[u8]) -> Result<Prediction> {
        let start = Instant::now();
        let (model, names) = self.ensure_ready().await?;
        let input = model
            .input
            .clone()
            .ok_or_else(|| ClassifyError::Config("model declares no inputs".to_string()))?;

        let tensor = preprocess(bytes, input.geometry, self.inner.config.resize_filter()).await?;
        let preprocessed = start.elapsed();

        let logits = {
            let model = Arc::clone(&model);
            tokio::task::spawn_blocking(move || model.run(&input.name, &tensor)).await??
        };

        let prediction = Prediction::from_logits(logits, &names)
            .ok_or_else(|| ClassifyError::Runtime("first output is empty".to_string()))?;
        log::debug!(
            "predicted {} (index {}, p={:.4}) in {:?} ({:?} preprocessing)",
            prediction.label,
            prediction.top_index,
            prediction.top_probability(),
            start.elapsed(),
            preprocessed
        );
        Ok(prediction)
    }

    async fn ensure_ready(&self) -> Result<(Arc<LoadedModel>, Arc<ClassNames>)> {
        if let (Some(model), Some(names)) = (self.inner.model.get(), self.inner.class_names.get()) {
            return Ok((Arc::clone(model), Arc::clone(names)));
        }
        // detached, so the cells are filled even if this caller goes away
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.initialize().await }).await?
    }
}

impl Inner {
    async fn initialize(&self) -> Result<(Arc<LoadedModel>, Arc<ClassNames>)> {
        let model = Arc::clone(self.model.get_or_try_init(|| self.load_model()).await?);
        let names = Arc::clone(
            self.class_names
                .get_or_try_init(|| self.resolve_class_names(Arc::clone(&model)))
                .await?,
        );
        Ok((model, names))
    }

    async fn load_model(&self) -> Result<Arc<LoadedModel>> {
        let backend = Arc::clone(&self.backend);
        let path = self.model_path.clone();
        let default_size = self.config.default_input_size();
        log::info!("loading model {} with {} backend", path.display(), backend.name());

        let start = Instant::now();
        let result =
            tokio::task::spawn_blocking(move || LoadedModel::load(backend.as_ref(), &path, default_size)).await?;
        match result {
            Ok(model) => {
                log::info!("model loaded in {:?}", start.elapsed());
                Ok(Arc::new(model))
            }
            Err(e) => {
                log::error!("failed to load model {}: {}", self.model_path.display(), e);
                Err(e)
            }
        }
    }

    async fn resolve_class_names(&self, model: Arc<LoadedModel>) -> Result<Arc<ClassNames>> {
        let store = Arc::clone(&self.store);
        let labels_path = self.labels_path.clone();
        let model_path = self.model_path.clone();
        let strategies = self.config.label_strategies().to_vec();

        let names = tokio::task::spawn_blocking(move || {
            let sources = LabelSources {
                store: store.as_ref(),
                labels_path: &labels_path,
                model_path: &model_path,
                metadata: Some(&model.metadata),
            };
            labels::resolve(&sources, &strategies)
        })
        .await?;
        Ok(Arc::new(names))
    }
}
