use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub const MODEL_FILE: &str = "model.onnx";
pub const LABELS_FILE: &str = "class_names.json";

/// Directories under each root where assets may live, in probe order.
const ASSET_SUBDIRS: [&str; 3] = ["", "src/inference", "dist/inference"];

/// Finds asset files across the plausible locations of a deployment.
///
/// Candidates are probed in order: every extra root, then the directory of
/// the running executable and the current working directory, each with the
/// subdirectories in `ASSET_SUBDIRS`.
#[derive(Clone, Debug)]
pub struct AssetLocator {
    extra_roots: Vec<PathBuf>,
    base_dirs: Vec<PathBuf>,
}

impl AssetLocator {
    /// Locator for the running process (executable directory and cwd).
    pub fn from_process() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let cwd = std::env::current_dir().ok();
        Self::with_base_dirs(exe_dir, cwd)
    }

    pub fn with_base_dirs(exe_dir: Option<PathBuf>, cwd: Option<PathBuf>) -> Self {
        let mut base_dirs: Vec<PathBuf> = exe_dir.into_iter().chain(cwd).collect();
        if base_dirs.is_empty() {
            base_dirs.push(PathBuf::from("."));
        }
        Self {
            extra_roots: Vec::new(),
            base_dirs,
        }
    }

    /// Probe `roots` before the process directories.
    pub fn with_extra_roots(mut self, roots: &[PathBuf]) -> Self {
        self.extra_roots.extend_from_slice(roots);
        self
    }

    pub fn candidates(&self, filename: &str) -> Vec<PathBuf> {
        self.extra_roots
            .iter()
            .chain(&self.base_dirs)
            .flat_map(|root| {
                ASSET_SUBDIRS.iter().map(move |sub| {
                    if sub.is_empty() {
                        root.join(filename)
                    } else {
                        root.join(sub).join(filename)
                    }
                })
            })
            .collect()
    }

    /// First existing candidate for `filename`.
    ///
    /// When nothing exists the runtime-adjacent candidate is returned anyway;
    /// whoever opens it reports the missing file.
    pub fn locate(&self, filename: &str) -> PathBuf {
        let candidates = self.candidates(filename);
        match candidates.iter().find(|path| is_file(path)) {
            Some(found) => {
                log::debug!("asset {} resolved to {}", filename, found.display());
                found.clone()
            }
            None => {
                let fallback = self.fallback(filename);
                log::debug!(
                    "asset {} not found in {} locations, using {}",
                    filename,
                    candidates.len(),
                    fallback.display()
                );
                fallback
            }
        }
    }

    fn fallback(&self, filename: &str) -> PathBuf {
        self.base_dirs
            .first()
            .map(|root| root.join(filename))
            .unwrap_or_else(|| PathBuf::from(filename))
    }
}

/// I/O errors while probing count as "not there".
fn is_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Read access to asset files.
pub trait AssetStore: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads assets straight from the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileStore;

impl AssetStore for FileStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}
