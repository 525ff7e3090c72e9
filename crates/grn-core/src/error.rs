/// Errors raised by blobs, kernels and layers.
#[derive(Debug, thiserror::Error)]
pub enum GrnError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{layer} layer takes exactly {expected} {kind} blob(s), got {got}")]
    BlobCount {
        layer: &'static str,
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error("Invalid shape {shape:?}: {reason}")]
    InvalidShape { shape: Vec<usize>, reason: String },

    #[error("Index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },

    #[error("Buffer length mismatch: expected {expected} elements, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}
