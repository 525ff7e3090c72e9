use crate::dtype::Element;

/// Contiguous CPU buffer backing one half (data or diff) of a blob.
///
/// Storage only ever grows: shrinking keeps the allocation so that a later
/// reshape back to the larger size is free.
#[derive(Debug, Clone, Default)]
pub struct Storage<T: Element> {
    data: Vec<T>,
}

impl<T: Element> Storage<T> {
    /// Empty storage with no allocation.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Allocate storage for `numel` zeroed elements.
    pub fn zeros(numel: usize) -> Self {
        Self {
            data: vec![T::zero(); numel],
        }
    }

    /// Number of logical elements.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Number of elements the current allocation can hold.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Resize to `numel` elements. Newly exposed elements are zero.
    ///
    /// Returns `true` when the buffer had to grow its allocation.
    pub fn resize(&mut self, numel: usize) -> bool {
        let grew = numel > self.data.capacity();
        self.data.resize(numel, T::zero());
        grew
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}
