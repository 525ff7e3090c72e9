use std::fmt;

use num_traits::Float;

/// Element types a [`Blob`](crate::Blob) can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit IEEE 754 single-precision float
    F32,
    /// 64-bit IEEE 754 double-precision float
    F64,
}

impl DType {
    /// Size in bytes of a single element.
    pub fn element_size(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    /// Number of bytes needed to store `n` elements of this dtype.
    pub fn storage_bytes(&self, n: usize) -> usize {
        self.element_size() * n
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "f32"),
            DType::F64 => write!(f, "f64"),
        }
    }
}

/// Scalar element of a blob.
///
/// Kernels and layers are generic over this trait so the same code serves
/// single and double precision.
pub trait Element:
    Float + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    const DTYPE: DType;

    /// Lossy conversion from `f64`, used for configuration scalars.
    fn from_f64_lossy(v: f64) -> Self;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    fn from_f64_lossy(v: f64) -> Self {
        v as f32
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    fn from_f64_lossy(v: f64) -> Self {
        v
    }
}
