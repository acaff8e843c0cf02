//! Food / not-food image classification.
//!
//! [`Classifier`] ties the pieces together: it finds the model and label
//! files, loads the model once, resolves the class names through a chain of
//! fallbacks, reads the expected input geometry off the model, turns image
//! bytes into a normalized `[1, 3, H, W]` tensor and maps the first output
//! through a softmax to a label.

pub mod assets;
pub mod backends;
mod classifier;
pub mod config;
pub mod error;
pub mod labels;
pub mod postprocess;
pub mod preprocess;
pub mod session;
pub mod shape;

pub use {
    assets::{AssetLocator, AssetStore, FileStore},
    backends::OnnxBackend,
    classifier::Classifier,
    config::ClassifierConfig,
    error::{ClassifyError, Result},
    image::ResizeFilter,
    labels::{ClassNames, LabelOrigin, LabelStrategy},
    postprocess::Prediction,
    session::{Backend, Dim, InputInfo, Session},
    shape::{InputGeometry, DEFAULT_INPUT_SIZE},
};
