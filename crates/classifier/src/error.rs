use std::fmt;

#[derive(Debug)]
pub enum ClassifyError {
    /// Model file missing, unreadable or rejected by the backend.
    ModelLoad(String),
    /// The loaded model cannot be driven by this pipeline.
    Config(String),
    /// The submitted image could not be decoded.
    Decode(String),
    /// Inference engine or worker failure.
    Runtime(String),
    Tensor(base::TensorError),
}

impl ClassifyError {
    /// The caller sent something unusable; retrying the same bytes will fail again.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, ClassifyError::Decode(_))
    }

    /// The service cannot classify anything until its assets are fixed.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, ClassifyError::ModelLoad(_) | ClassifyError::Config(_))
    }
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::ModelLoad(msg) => write!(f, "model not ready: {msg}"),
            ClassifyError::Config(msg) => write!(f, "model configuration error: {msg}"),
            ClassifyError::Decode(msg) => write!(f, "invalid image: {msg}"),
            ClassifyError::Runtime(msg) => write!(f, "inference failed: {msg}"),
            ClassifyError::Tensor(err) => write!(f, "tensor error: {err}"),
        }
    }
}

impl std::error::Error for ClassifyError {}

impl From<base::TensorError> for ClassifyError {
    fn from(err: base::TensorError) -> Self {
        ClassifyError::Tensor(err)
    }
}

impl From<image::ImageError> for ClassifyError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Tensor(err) => ClassifyError::Tensor(err),
            image::ImageError::Worker(msg) => ClassifyError::Runtime(format!("worker task failed: {msg}")),
            other => ClassifyError::Decode(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ClassifyError {
    fn from(err: tokio::task::JoinError) -> Self {
        ClassifyError::Runtime(format!("worker task failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_errors_map_to_kinds() {
        let err = ClassifyError::from(image::ImageError::Decode("not a png".to_string()));
        assert!(err.is_bad_input());

        let err = ClassifyError::from(image::ImageError::Worker("task panicked".to_string()));
        assert!(matches!(err, ClassifyError::Runtime(_)), "{err}");
        assert!(!err.is_bad_input());
        assert!(!err.is_not_ready());
    }
}
