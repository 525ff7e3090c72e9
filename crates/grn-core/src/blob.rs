use std::fmt;

use crate::dtype::{DType, Element};
use crate::error::GrnError;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::Result;

/// A 4-D buffer pair exchanged between layers.
///
/// `data` holds the values produced by a forward pass and `diff` holds the
/// gradient with respect to those values. Both halves always share the same
/// shape and the same flat row-major layout: num outermost, width innermost.
///
/// # Examples
///
/// ```
/// use grn_core::Blob;
///
/// let b = Blob::from_data(&[1.0f32, 2.0, 3.0, 4.0], &[1, 2, 1, 2]).unwrap();
/// assert_eq!(b.channels(), 2);
/// assert_eq!(b.offset(0, 1).unwrap(), 2);
/// assert_eq!(b.at(0, 1, 0, 1).unwrap(), 4.0);
/// ```
#[derive(Clone, Default)]
pub struct Blob<T: Element> {
    shape: Shape,
    data: Storage<T>,
    diff: Storage<T>,
}

impl<T: Element> Blob<T> {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Zero-filled blob of the given shape.
    pub fn zeros(shape: &[usize]) -> Self {
        let shape = Shape::new(shape);
        let numel = shape.numel();
        Self {
            shape,
            data: Storage::zeros(numel),
            diff: Storage::zeros(numel),
        }
    }

    /// Zero-filled (num, channels, height, width) blob.
    pub fn nchw(num: usize, channels: usize, height: usize, width: usize) -> Self {
        Self::zeros(&[num, channels, height, width])
    }

    /// Blob whose `data` is a copy of `values`; `diff` starts zeroed.
    pub fn from_data(values: &[T], shape: &[usize]) -> Result<Self> {
        let mut blob = Self::zeros(shape);
        blob.set_data(values)?;
        Ok(blob)
    }

    // =========================================================================
    // Shape
    // =========================================================================

    /// Change the shape, growing the backing storage only when needed.
    ///
    /// Returns `true` when either buffer had to reallocate.
    pub fn reshape(&mut self, shape: &[usize]) -> bool {
        self.shape = Shape::new(shape);
        let numel = self.shape.numel();
        let grew_data = self.data.resize(numel);
        let grew_diff = self.diff.resize(numel);
        grew_data || grew_diff
    }

    /// Take the shape of another blob.
    pub fn reshape_like<U: Element>(&mut self, other: &Blob<U>) -> bool {
        let dims = other.shape().dims().to_vec();
        self.reshape(&dims)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn num(&self) -> usize {
        self.shape.num()
    }

    pub fn channels(&self) -> usize {
        self.shape.channels()
    }

    pub fn height(&self) -> usize {
        self.shape.height()
    }

    pub fn width(&self) -> usize {
        self.shape.width()
    }

    /// Total number of elements.
    pub fn count(&self) -> usize {
        self.shape.numel()
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Flat index of the first element of channel `c` in sample `n`.
    pub fn offset(&self, n: usize, c: usize) -> Result<usize> {
        self.shape.offset(n, c, 0, 0)
    }

    /// Flat index of element (n, c, h, w).
    pub fn offset4(&self, n: usize, c: usize, h: usize, w: usize) -> Result<usize> {
        self.shape.offset(n, c, h, w)
    }

    // =========================================================================
    // Data access
    // =========================================================================

    pub fn data(&self) -> &[T] {
        self.data.as_slice()
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        self.data.as_mut_slice()
    }

    pub fn diff(&self) -> &[T] {
        self.diff.as_slice()
    }

    pub fn diff_mut(&mut self) -> &mut [T] {
        self.diff.as_mut_slice()
    }

    /// Read `data` while writing `diff`.
    pub fn data_and_diff_mut(&mut self) -> (&[T], &mut [T]) {
        (self.data.as_slice(), self.diff.as_mut_slice())
    }

    /// Capacity of the data buffer in elements.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Single data element by (n, c, h, w).
    pub fn at(&self, n: usize, c: usize, h: usize, w: usize) -> Result<T> {
        Ok(self.data()[self.offset4(n, c, h, w)?])
    }

    /// Single diff element by (n, c, h, w).
    pub fn diff_at(&self, n: usize, c: usize, h: usize, w: usize) -> Result<T> {
        Ok(self.diff()[self.offset4(n, c, h, w)?])
    }

    /// Spatial slab of `data` for channel `c` of sample `n`.
    pub fn channel_data(&self, n: usize, c: usize) -> Result<&[T]> {
        let start = self.offset(n, c)?;
        Ok(&self.data()[start..start + self.shape.spatial_dim()])
    }

    /// Spatial slab of `diff` for channel `c` of sample `n`.
    pub fn channel_diff(&self, n: usize, c: usize) -> Result<&[T]> {
        let start = self.offset(n, c)?;
        Ok(&self.diff()[start..start + self.shape.spatial_dim()])
    }

    /// Overwrite `data` with `values`.
    pub fn set_data(&mut self, values: &[T]) -> Result<()> {
        copy_checked(values, self.data.as_mut_slice())
    }

    /// Overwrite `diff` with `values`.
    pub fn set_diff(&mut self, values: &[T]) -> Result<()> {
        copy_checked(values, self.diff.as_mut_slice())
    }

    pub fn fill_data(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn fill_diff(&mut self, value: T) {
        self.diff.fill(value);
    }

    /// Error unless this blob has the expected shape.
    pub fn expect_shape(&self, expected: &Shape) -> Result<()> {
        if self.shape != *expected {
            return Err(GrnError::ShapeMismatch {
                expected: expected.dims().to_vec(),
                got: self.shape.dims().to_vec(),
            });
        }
        Ok(())
    }
}

fn copy_checked<T: Copy>(src: &[T], dst: &mut [T]) -> Result<()> {
    if src.len() != dst.len() {
        return Err(GrnError::LengthMismatch {
            expected: dst.len(),
            got: src.len(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}

impl<T: Element> fmt::Debug for Blob<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Blob(shape={}, dtype={}, capacity={})",
            self.shape,
            T::DTYPE,
            self.data.capacity(),
        )
    }
}

impl<T: Element> fmt::Display for Blob<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        if data.len() <= 20 {
            write!(f, "blob({:?}, shape={:?})", data, self.shape.dims())
        } else {
            write!(
                f,
                "blob([{:.4}, {:.4}, ..., {:.4}], shape={:?})",
                data[0],
                data[1],
                data[data.len() - 1],
                self.shape.dims()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let b = Blob::<f32>::nchw(2, 3, 4, 5);
        assert_eq!(b.count(), 120);
        assert_eq!(b.data().len(), 120);
        assert_eq!(b.diff().len(), 120);
        assert!(b.data().iter().all(|&v| v == 0.0));
        assert_eq!(b.dtype(), DType::F32);
    }

    #[test]
    fn test_from_data_length_check() {
        let err = Blob::from_data(&[1.0f64, 2.0, 3.0], &[1, 2, 1, 1]).unwrap_err();
        assert!(matches!(err, GrnError::LengthMismatch { expected: 2, got: 3 }));
    }

    #[test]
    fn test_offsets_and_slabs() {
        let values: Vec<f32> = (0..24).map(|v| v as f32).collect();
        let b = Blob::from_data(&values, &[2, 3, 2, 2]).unwrap();
        assert_eq!(b.offset(1, 2).unwrap(), 20);
        assert_eq!(b.channel_data(1, 2).unwrap(), &[20.0, 21.0, 22.0, 23.0]);
        assert_eq!(b.at(0, 1, 1, 0).unwrap(), 6.0);
        assert!(b.offset(2, 0).is_err());
        assert!(b.at(0, 3, 0, 0).is_err());
    }

    #[test]
    fn test_reshape_reuses_allocation() {
        let mut b = Blob::<f32>::nchw(2, 4, 3, 3);
        let cap = b.capacity();
        assert!(!b.reshape(&[1, 4, 3, 3]));
        assert_eq!(b.count(), 36);
        assert!(!b.reshape(&[2, 4, 3, 3]));
        assert_eq!(b.capacity(), cap);
        assert!(b.reshape(&[4, 4, 3, 3]));
        assert_eq!(b.count(), 144);
    }

    #[test]
    fn test_reshape_like() {
        let a = Blob::<f64>::nchw(1, 2, 3, 4);
        let mut b = Blob::<f64>::default();
        b.reshape_like(&a);
        assert_eq!(b.shape(), a.shape());
        assert!(b.expect_shape(a.shape()).is_ok());
        assert!(b.expect_shape(&Shape::nchw(1, 2, 3, 5)).is_err());
    }

    #[test]
    fn test_data_and_diff_mut() {
        let mut b = Blob::from_data(&[1.0f32, 2.0], &[1, 2, 1, 1]).unwrap();
        let (data, diff) = b.data_and_diff_mut();
        diff.copy_from_slice(data);
        assert_eq!(b.diff(), &[1.0, 2.0]);
        assert_eq!(b.diff_at(0, 1, 0, 0).unwrap(), 2.0);
    }

    #[test]
    fn test_debug_display() {
        let b = Blob::from_data(&[1.0f32, 2.0], &[1, 2, 1, 1]).unwrap();
        assert!(format!("{b:?}").contains("f32"));
        assert!(format!("{b}").starts_with("blob("));
    }
}
