use std::fmt;

#[derive(Debug)]
pub enum ImageError {
    Decode(String),
    Resize(String),
    Tensor(base::TensorError),
    /// The blocking decode task panicked or was cancelled.
    Worker(String),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Decode(msg) => write!(f, "decode error: {msg}"),
            ImageError::Resize(msg) => write!(f, "resize error: {msg}"),
            ImageError::Tensor(err) => write!(f, "tensor error: {err}"),
            ImageError::Worker(msg) => write!(f, "worker task failed: {msg}"),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<crates_image::ImageError> for ImageError {
    fn from(err: crates_image::ImageError) -> Self {
        ImageError::Decode(err.to_string())
    }
}

impl From<base::TensorError> for ImageError {
    fn from(err: base::TensorError) -> Self {
        ImageError::Tensor(err)
    }
}
