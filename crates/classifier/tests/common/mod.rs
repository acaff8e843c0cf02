#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base::Tensor;
use classifier::{AssetStore, Backend, ClassifyError, Dim, FileStore, InputInfo, Session};

/// What the fake backend hands out on every load.
#[derive(Clone, Debug)]
pub struct FakeModel {
    pub inputs: Vec<InputInfo>,
    pub outputs: Vec<String>,
    pub metadata: HashMap<String, String>,
    pub logits: Vec<f32>,
    /// Outputs that do not hold f32 data.
    pub non_f32: Vec<String>,
}

impl FakeModel {
    /// One `[1, 3, size, size]` input and one output producing `logits`.
    pub fn nchw(size: i64, logits: Vec<f32>) -> Self {
        Self {
            inputs: vec![InputInfo::new("input", Some(dims(&[-1, 3, size, size])))],
            outputs: vec!["logits".to_string()],
            metadata: HashMap::new(),
            logits,
            non_f32: Vec::new(),
        }
    }

    /// Append an output of another element type, such as an int64 label.
    pub fn with_non_f32_output(mut self, name: &str) -> Self {
        self.outputs.push(name.to_string());
        self.non_f32.push(name.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

pub fn dims(values: &[i64]) -> Vec<Dim> {
    values.iter().map(|&v| Dim::from(v)).collect()
}

pub type Recorded = Arc<Mutex<Vec<(String, Tensor<f32>)>>>;

pub struct FakeBackend {
    model: FakeModel,
    loads: AtomicUsize,
    failures_left: AtomicUsize,
    load_delay: Duration,
    recorded: Recorded,
}

impl FakeBackend {
    pub fn new(model: FakeModel) -> Self {
        Self {
            model,
            loads: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            load_delay: Duration::ZERO,
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail the next `count` loads.
    pub fn failing(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Load attempts so far, failed ones included.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Every `(input name, tensor)` fed to a session.
    pub fn recorded(&self) -> Vec<(String, Tensor<f32>)> {
        self.recorded.lock().unwrap().clone()
    }
}

impl Backend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn load_model(&self, path: &Path) -> classifier::Result<Box<dyn Session>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.load_delay);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ClassifyError::ModelLoad(format!("cannot open {}", path.display())));
        }
        Ok(Box::new(FakeSession {
            model: self.model.clone(),
            recorded: Arc::clone(&self.recorded),
        }))
    }
}

struct FakeSession {
    model: FakeModel,
    recorded: Recorded,
}

impl Session for FakeSession {
    fn inputs(&self) -> &[InputInfo] {
        &self.model.inputs
    }

    fn output_names(&self) -> &[String] {
        &self.model.outputs
    }

    fn custom_metadata(&self) -> &HashMap<String, String> {
        &self.model.metadata
    }

    fn run(&mut self, input_name: &str, input: &Tensor<f32>) -> classifier::Result<Tensor<f32>> {
        self.recorded.lock().unwrap().push((input_name.to_string(), input.clone()));
        let first = self
            .model
            .outputs
            .first()
            .ok_or_else(|| ClassifyError::Runtime("model declares no outputs".to_string()))?;
        if self.model.non_f32.contains(first) {
            return Err(ClassifyError::Runtime(format!("output {} is not f32", first)));
        }
        let logits = self.model.logits.clone();
        Ok(Tensor::new(vec![1, logits.len()], logits)?)
    }
}

/// Filesystem store that counts reads per path.
#[derive(Default)]
pub struct CountingStore {
    reads: Mutex<HashMap<PathBuf, usize>>,
}

impl CountingStore {
    pub fn reads(&self, path: &Path) -> usize {
        self.reads.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

impl AssetStore for CountingStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        *self.reads.lock().unwrap().entry(path.to_path_buf()).or_default() += 1;
        FileStore.read(path)
    }
}

/// PNG of a single solid color.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = crates_image::RgbImage::from_pixel(width, height, crates_image::Rgb(rgb));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, crates_image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}
