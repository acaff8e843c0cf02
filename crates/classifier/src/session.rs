use {
    crate::error::Result,
    base::Tensor,
    std::{collections::HashMap, path::Path},
};

/// One declared dimension of a model input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dim {
    Fixed(i64),
    /// Symbolic or free dimension (a dynamic batch axis, `-1`, a named axis).
    Dynamic,
}

impl Dim {
    /// The dimension as a usable size: fixed and strictly positive.
    pub fn size(&self) -> Option<usize> {
        match self {
            Dim::Fixed(n) if *n > 0 => usize::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl From<i64> for Dim {
    fn from(value: i64) -> Self {
        if value < 0 {
            Dim::Dynamic
        } else {
            Dim::Fixed(value)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputInfo {
    pub name: String,
    /// `None` when the input is not a tensor or declares no shape.
    pub dims: Option<Vec<Dim>>,
}

impl InputInfo {
    pub fn new(name: impl Into<String>, dims: Option<Vec<Dim>>) -> Self {
        Self {
            name: name.into(),
            dims,
        }
    }
}

/// A loaded model ready to run.
pub trait Session: Send {
    /// Declared inputs, in model order.
    fn inputs(&self) -> &[InputInfo];

    /// Declared output names, in model order.
    fn output_names(&self) -> &[String];

    /// Custom key/value metadata embedded in the model file.
    fn custom_metadata(&self) -> &HashMap<String, String>;

    /// Feed `input` to the input called `input_name` and return the first
    /// declared output as an f32 tensor. Later outputs are never read.
    fn run(&mut self, input_name: &str, input: &Tensor<f32>) -> Result<Tensor<f32>>;
}

/// Creates sessions from model files.
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;
    fn load_model(&self, path: &Path) -> Result<Box<dyn Session>>;
}
