use {
    crate::{
        assets::{LABELS_FILE, MODEL_FILE},
        labels::LabelStrategy,
        shape::DEFAULT_INPUT_SIZE,
    },
    image::ResizeFilter,
    std::path::PathBuf,
};

pub const MODEL_PATH_ENV: &str = "CLASSIFIER_MODEL_PATH";
pub const LABELS_PATH_ENV: &str = "CLASSIFIER_LABELS_PATH";
pub const ASSET_DIR_ENV: &str = "CLASSIFIER_ASSET_DIR";
pub const DISABLE_MODEL_SCAN_ENV: &str = "CLASSIFIER_DISABLE_MODEL_SCAN";
pub const INTRA_THREADS_ENV: &str = "CLASSIFIER_INTRA_THREADS";
pub const RESIZE_FILTER_ENV: &str = "CLASSIFIER_RESIZE_FILTER";
/// Comma-separated, tried in order.
pub const LABEL_STRATEGIES_ENV: &str = "CLASSIFIER_LABEL_STRATEGIES";

/// Configuration for a classifier.
#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    model_file: String,
    labels_file: String,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    asset_roots: Vec<PathBuf>,
    label_strategies: Vec<LabelStrategy>,
    default_input_size: usize,
    resize_filter: ResizeFilter,
    intra_threads: Option<usize>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_file: MODEL_FILE.to_string(),
            labels_file: LABELS_FILE.to_string(),
            model_path: None,
            labels_path: None,
            asset_roots: Vec::new(),
            label_strategies: LabelStrategy::ALL.to_vec(),
            default_input_size: DEFAULT_INPUT_SIZE,
            resize_filter: ResizeFilter::default(),
            intra_threads: None,
        }
    }
}

impl ClassifierConfig {
    /// Defaults overridden by the `CLASSIFIER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClassifierConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(path) = var(MODEL_PATH_ENV) {
            config = config.with_model_path(path);
        }
        if let Some(path) = var(LABELS_PATH_ENV) {
            config = config.with_labels_path(path);
        }
        if let Some(dir) = var(ASSET_DIR_ENV) {
            config = config.with_asset_root(dir);
        }
        if let Some(list) = var(LABEL_STRATEGIES_ENV) {
            match list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse::<LabelStrategy>)
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(strategies) if !strategies.is_empty() => config = config.with_label_strategies(&strategies),
                Ok(_) => log::warn!("ignoring {}={:?}: no strategies", LABEL_STRATEGIES_ENV, list),
                Err(e) => log::warn!("ignoring {}={:?}: {}", LABEL_STRATEGIES_ENV, list, e),
            }
        }
        if let Some(flag) = var(DISABLE_MODEL_SCAN_ENV) {
            if flag == "1" || flag.eq_ignore_ascii_case("true") {
                config = config.without_label_strategy(LabelStrategy::ModelScan);
            }
        }
        if let Some(threads) = var(INTRA_THREADS_ENV) {
            match threads.parse::<usize>() {
                Ok(n) if n > 0 => config = config.with_intra_threads(n),
                _ => log::warn!("ignoring {}={:?}: not a positive integer", INTRA_THREADS_ENV, threads),
            }
        }
        if let Some(filter) = var(RESIZE_FILTER_ENV) {
            match filter.parse::<ResizeFilter>() {
                Ok(filter) => config = config.with_resize_filter(filter),
                Err(e) => log::warn!("ignoring {}={:?}: {}", RESIZE_FILTER_ENV, filter, e),
            }
        }
        config
    }

    /// Set the model file name looked up by the asset locator.
    pub fn with_model_file(mut self, name: impl Into<String>) -> Self {
        self.model_file = name.into();
        self
    }

    /// Set the label file name looked up by the asset locator.
    pub fn with_labels_file(mut self, name: impl Into<String>) -> Self {
        self.labels_file = name.into();
        self
    }

    /// Use this model file instead of searching for one.
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Use this label file instead of searching for one.
    pub fn with_labels_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.labels_path = Some(path.into());
        self
    }

    /// Add a directory probed before the built-in asset locations.
    pub fn with_asset_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_roots.push(dir.into());
        self
    }

    /// Set the label strategies, in order. Repeats are dropped.
    pub fn with_label_strategies(mut self, strategies: &[LabelStrategy]) -> Self {
        self.label_strategies.clear();
        for &strategy in strategies {
            if !self.label_strategies.contains(&strategy) {
                self.label_strategies.push(strategy);
            }
        }
        self
    }

    pub fn without_label_strategy(mut self, strategy: LabelStrategy) -> Self {
        self.label_strategies.retain(|&s| s != strategy);
        self
    }

    /// Set the square size used when the model declares no usable geometry.
    pub fn with_default_input_size(mut self, size: usize) -> Self {
        self.default_input_size = size;
        self
    }

    pub fn with_resize_filter(mut self, filter: ResizeFilter) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Set the ONNX Runtime intra-op thread count.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    // Getters
    pub fn model_file(&self) -> &str {
        &self.model_file
    }

    pub fn labels_file(&self) -> &str {
        &self.labels_file
    }

    pub fn model_path(&self) -> Option<&PathBuf> {
        self.model_path.as_ref()
    }

    pub fn labels_path(&self) -> Option<&PathBuf> {
        self.labels_path.as_ref()
    }

    pub fn asset_roots(&self) -> &[PathBuf] {
        &self.asset_roots
    }

    pub fn label_strategies(&self) -> &[LabelStrategy] {
        &self.label_strategies
    }

    pub fn default_input_size(&self) -> usize {
        self.default_input_size
    }

    pub fn resize_filter(&self) -> ResizeFilter {
        self.resize_filter
    }

    pub fn intra_threads(&self) -> Option<usize> {
        self.intra_threads
    }
}
