use smallvec::SmallVec;
use std::fmt;

use crate::error::GrnError;
use crate::Result;

/// Maximum rank addressable through the legacy (num, channels, height, width)
/// accessors.
pub const LEGACY_AXES: usize = 4;

/// Blob shape with stack-allocated storage for ≤4 dimensions.
///
/// Layers in this workspace see 4-D (N, C, H, W) buffers, so the common case
/// never touches the heap.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: SmallVec<[usize; 4]>,
}

impl Shape {
    /// Create a new shape from dimensions.
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    /// Create a 4-D (num, channels, height, width) shape.
    pub fn nchw(num: usize, channels: usize, height: usize, width: usize) -> Self {
        Self::new(&[num, channels, height, width])
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements. An empty shape holds no data.
    pub fn numel(&self) -> usize {
        if self.dims.is_empty() {
            0
        } else {
            self.dims.iter().product()
        }
    }

    /// Get dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Get size of a specific dimension.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    /// Size of a legacy axis, treating missing trailing axes as 1.
    fn legacy_dim(&self, axis: usize) -> usize {
        self.dims.get(axis).copied().unwrap_or(1)
    }

    /// Batch size (axis 0).
    pub fn num(&self) -> usize {
        self.legacy_dim(0)
    }

    /// Channel count (axis 1).
    pub fn channels(&self) -> usize {
        self.legacy_dim(1)
    }

    /// Height (axis 2).
    pub fn height(&self) -> usize {
        self.legacy_dim(2)
    }

    /// Width (axis 3).
    pub fn width(&self) -> usize {
        self.legacy_dim(3)
    }

    /// Elements per spatial slab (height × width).
    pub fn spatial_dim(&self) -> usize {
        self.height() * self.width()
    }

    /// Elements per sample (channels × height × width).
    pub fn sample_dim(&self) -> usize {
        self.channels() * self.spatial_dim()
    }

    /// Whether the shape can be addressed as (N, C, H, W).
    pub fn check_legacy(&self) -> Result<()> {
        if self.ndim() == 0 {
            return Err(GrnError::InvalidShape {
                shape: Vec::new(),
                reason: "blob has no axes".to_string(),
            });
        }
        if self.ndim() > LEGACY_AXES {
            return Err(GrnError::InvalidShape {
                shape: self.dims.to_vec(),
                reason: format!("legacy accessors support at most {LEGACY_AXES} axes"),
            });
        }
        Ok(())
    }

    /// Flat row-major index of element (n, c, h, w), bounds-checked.
    pub fn offset(&self, n: usize, c: usize, h: usize, w: usize) -> Result<usize> {
        if n >= self.num() || c >= self.channels() || h >= self.height() || w >= self.width() {
            return Err(GrnError::IndexOutOfBounds {
                index: vec![n, c, h, w],
                shape: self.dims.to_vec(),
            });
        }
        Ok(((n * self.channels() + c) * self.height() + h) * self.width() + w)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.dims.as_slice())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "] ({})", self.numel())
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape {
            dims: SmallVec::from_vec(dims),
        }
    }
}

macro_rules! impl_shape_from_array {
    ($($n:expr),*) => {
        $(
            impl From<[usize; $n]> for Shape {
                fn from(dims: [usize; $n]) -> Self {
                    Shape::new(&dims)
                }
            }
        )*
    };
}

impl_shape_from_array!(1, 2, 3, 4, 5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nchw_accessors() {
        let s = Shape::nchw(2, 3, 4, 5);
        assert_eq!(s.ndim(), 4);
        assert_eq!(s.numel(), 120);
        assert_eq!(s.num(), 2);
        assert_eq!(s.channels(), 3);
        assert_eq!(s.height(), 4);
        assert_eq!(s.width(), 5);
        assert_eq!(s.spatial_dim(), 20);
        assert_eq!(s.sample_dim(), 60);
    }

    #[test]
    fn test_missing_axes_are_one() {
        let s = Shape::new(&[2, 3]);
        assert_eq!(s.height(), 1);
        assert_eq!(s.width(), 1);
        assert_eq!(s.spatial_dim(), 1);
        assert!(s.check_legacy().is_ok());
    }

    #[test]
    fn test_empty_shape_has_no_elements() {
        assert_eq!(Shape::default().numel(), 0);
    }

    #[test]
    fn test_offset() {
        let s = Shape::nchw(2, 3, 4, 5);
        assert_eq!(s.offset(0, 0, 0, 0).unwrap(), 0);
        assert_eq!(s.offset(0, 1, 0, 0).unwrap(), 20);
        assert_eq!(s.offset(1, 0, 0, 0).unwrap(), 60);
        assert_eq!(s.offset(1, 2, 3, 4).unwrap(), 119);
        assert!(s.offset(2, 0, 0, 0).is_err());
        assert!(s.offset(0, 0, 0, 5).is_err());
    }

    #[test]
    fn test_rank_zero_is_not_legacy() {
        let s = Shape::default();
        assert!(matches!(s.check_legacy(), Err(GrnError::InvalidShape { .. })));
    }

    #[test]
    fn test_too_many_axes() {
        let s: Shape = [1, 2, 3, 4, 5].into();
        assert!(matches!(s.check_legacy(), Err(GrnError::InvalidShape { .. })));
    }

    #[test]
    fn test_display() {
        let s: Shape = [1, 2, 1, 1].into();
        assert_eq!(format!("{s}"), "[1, 2, 1, 1] (2)");
        assert_eq!(format!("{s:?}"), "Shape([1, 2, 1, 1])");
    }
}
