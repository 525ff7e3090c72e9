//! Global Response Normalization kernels.
//!
//! Forward, per sample `i` and spatial position `p`:
//!
//! ```text
//! norm[i][p] = sqrt(bias + Σ_c x[i][c][p]²)
//! y[i][c][p] = x[i][c][p] / norm[i][p]
//! ```
//!
//! Backward, reusing the `norm` recorded by forward:
//!
//! ```text
//! dot[i][p]   = Σ_c dy[i][c][p] · y[i][c][p] / norm[i][p]²
//! dx[i][c][p] = dy[i][c][p] / norm[i][p] − x[i][c][p] · dot[i][p]
//! ```
//!
//! A zero norm (bias 0 and an all-zero channel vector) is not guarded.

use std::fmt;

use rayon::prelude::*;

use grn_core::{Element, GrnError, Result};

use crate::math;

/// Below this many elements the parallel kernel runs serially.
const PAR_THRESHOLD: usize = 16 * 1024;

/// Extents of a GRN problem: `num` samples of `channels × spatial` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrnDims {
    pub num: usize,
    pub channels: usize,
    pub spatial: usize,
}

impl GrnDims {
    pub fn new(num: usize, channels: usize, spatial: usize) -> Self {
        Self { num, channels, spatial }
    }

    /// Elements per sample.
    pub fn sample_dim(&self) -> usize {
        self.channels * self.spatial
    }

    /// Elements in a full (N, C, H, W) buffer.
    pub fn count(&self) -> usize {
        self.num * self.sample_dim()
    }

    /// Elements in a per-position (N, 1, H, W) buffer.
    pub fn norm_count(&self) -> usize {
        self.num * self.spatial
    }

    fn check(&self, expected: usize, got: usize) -> Result<()> {
        if expected != got {
            return Err(GrnError::LengthMismatch { expected, got });
        }
        Ok(())
    }
}

/// Buffers touched by a forward pass.
pub struct ForwardBuffers<'a, T> {
    /// Input x, (N, C, H, W).
    pub bottom: &'a [T],
    /// Output y, (N, C, H, W).
    pub top: &'a mut [T],
    /// Scratch, (N, C, H, W).
    pub squares: &'a mut [T],
    /// Per-position norm, (N, 1, H, W). Retained for backward.
    pub norm: &'a mut [T],
    /// Channel reduction vector of ones, (C).
    pub ones: &'a [T],
}

impl<T> ForwardBuffers<'_, T> {
    fn validate(&self, dims: &GrnDims) -> Result<()> {
        dims.check(dims.count(), self.bottom.len())?;
        dims.check(dims.count(), self.top.len())?;
        dims.check(dims.count(), self.squares.len())?;
        dims.check(dims.norm_count(), self.norm.len())?;
        dims.check(dims.channels, self.ones.len())
    }
}

/// Buffers touched by a backward pass.
pub struct BackwardBuffers<'a, T> {
    /// Output gradient dy, (N, C, H, W).
    pub top_diff: &'a [T],
    /// Output y from the matching forward, (N, C, H, W).
    pub top_data: &'a [T],
    /// Input x from the matching forward, (N, C, H, W).
    pub bottom_data: &'a [T],
    /// Norm recorded by the matching forward, (N, 1, H, W).
    pub norm: &'a [T],
    /// Input gradient dx, (N, C, H, W).
    pub bottom_diff: &'a mut [T],
    /// Scratch, (N, 1, H, W).
    pub dot: &'a mut [T],
    /// Scratch, (N, C, H, W).
    pub temp: &'a mut [T],
}

impl<T> BackwardBuffers<'_, T> {
    fn validate(&self, dims: &GrnDims) -> Result<()> {
        dims.check(dims.count(), self.top_diff.len())?;
        dims.check(dims.count(), self.top_data.len())?;
        dims.check(dims.count(), self.bottom_data.len())?;
        dims.check(dims.norm_count(), self.norm.len())?;
        dims.check(dims.count(), self.bottom_diff.len())?;
        dims.check(dims.norm_count(), self.dot.len())?;
        dims.check(dims.count(), self.temp.len())
    }
}

/// GRN forward for a single sample.
///
/// `bottom`, `top`, `squares` hold `channels × spatial` values; `norm` holds
/// `spatial` values.
#[allow(clippy::too_many_arguments)]
pub fn forward_sample<T: Element>(
    bottom: &[T],
    top: &mut [T],
    squares: &mut [T],
    norm: &mut [T],
    ones: &[T],
    channels: usize,
    spatial: usize,
    bias: T,
) {
    top.copy_from_slice(bottom);
    squares.copy_from_slice(bottom);

    math::sqr(squares);
    // sum across channels: norm = squaresᵀ · ones
    math::gemv_t(channels, spatial, T::one(), squares, ones, T::zero(), norm);
    math::add_scalar(norm, bias);
    math::powx(norm, T::from_f64_lossy(0.5));

    if spatial == 0 {
        return;
    }
    for channel in top.chunks_exact_mut(spatial) {
        math::div(channel, norm);
    }
}

/// GRN backward for a single sample. Slice extents as in [`forward_sample`].
#[allow(clippy::too_many_arguments)]
pub fn backward_sample<T: Element>(
    top_diff: &[T],
    top_data: &[T],
    bottom_data: &[T],
    norm: &[T],
    bottom_diff: &mut [T],
    dot: &mut [T],
    temp: &mut [T],
    channels: usize,
    spatial: usize,
) {
    bottom_diff.copy_from_slice(top_diff);
    if spatial == 0 || channels == 0 {
        return;
    }

    for (k, (d, &n)) in dot.iter_mut().zip(norm).enumerate() {
        let proj = math::strided_dot(channels, &top_diff[k..], spatial, &top_data[k..], spatial);
        *d = proj / (n * n);
    }

    let rows = bottom_diff
        .chunks_exact_mut(spatial)
        .zip(bottom_data.chunks_exact(spatial))
        .zip(temp.chunks_exact_mut(spatial));
    for ((diff, data), scratch) in rows {
        math::div(diff, norm);
        math::mul(data, dot, scratch);
        math::axpy(-T::one(), scratch, diff);
    }
}

/// A GRN implementation for one kind of compute capability.
///
/// Every implementation must produce the same values as [`CpuKernel`] up to
/// floating-point tolerance.
pub trait GrnKernel<T: Element>: Send + Sync + fmt::Debug {
    /// Name of this kernel (for logging).
    fn name(&self) -> &'static str;

    /// Normalize `bottom` into `top`, recording `norm`.
    fn forward(&self, dims: GrnDims, bias: T, bufs: ForwardBuffers<'_, T>) -> Result<()>;

    /// Write the input gradient into `bottom_diff`.
    fn backward(&self, dims: GrnDims, bufs: BackwardBuffers<'_, T>) -> Result<()>;
}

/// Serial reference kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuKernel;

impl<T: Element> GrnKernel<T> for CpuKernel {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn forward(&self, dims: GrnDims, bias: T, mut bufs: ForwardBuffers<'_, T>) -> Result<()> {
        bufs.validate(&dims)?;
        let dim = dims.sample_dim();
        let spatial = dims.spatial;
        for i in 0..dims.num {
            let s = i * dim..(i + 1) * dim;
            let p = i * spatial..(i + 1) * spatial;
            forward_sample(
                &bufs.bottom[s.clone()],
                &mut bufs.top[s.clone()],
                &mut bufs.squares[s],
                &mut bufs.norm[p],
                bufs.ones,
                dims.channels,
                spatial,
                bias,
            );
        }
        Ok(())
    }

    fn backward(&self, dims: GrnDims, mut bufs: BackwardBuffers<'_, T>) -> Result<()> {
        bufs.validate(&dims)?;
        let dim = dims.sample_dim();
        let spatial = dims.spatial;
        for i in 0..dims.num {
            let s = i * dim..(i + 1) * dim;
            let p = i * spatial..(i + 1) * spatial;
            backward_sample(
                &bufs.top_diff[s.clone()],
                &bufs.top_data[s.clone()],
                &bufs.bottom_data[s.clone()],
                &bufs.norm[p.clone()],
                &mut bufs.bottom_diff[s.clone()],
                &mut bufs.dot[p],
                &mut bufs.temp[s],
                dims.channels,
                spatial,
            );
        }
        Ok(())
    }
}

/// Batch-parallel kernel on the rayon thread pool.
///
/// Samples touch disjoint memory, so splitting the batch across threads
/// gives the same values as [`CpuKernel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelKernel;

impl ParallelKernel {
    fn serial(dims: &GrnDims) -> bool {
        dims.count() < PAR_THRESHOLD || dims.num < 2 || dims.sample_dim() == 0
    }
}

impl<T: Element> GrnKernel<T> for ParallelKernel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn forward(&self, dims: GrnDims, bias: T, mut bufs: ForwardBuffers<'_, T>) -> Result<()> {
        if Self::serial(&dims) {
            return GrnKernel::<T>::forward(&CpuKernel, dims, bias, bufs);
        }
        bufs.validate(&dims)?;
        let dim = dims.sample_dim();
        let (channels, spatial) = (dims.channels, dims.spatial);
        let ones = bufs.ones;

        bufs.top
            .par_chunks_mut(dim)
            .zip(bufs.squares.par_chunks_mut(dim))
            .zip(bufs.norm.par_chunks_mut(spatial))
            .zip(bufs.bottom.par_chunks(dim))
            .for_each(|(((top, squares), norm), bottom)| {
                forward_sample(bottom, top, squares, norm, ones, channels, spatial, bias);
            });
        Ok(())
    }

    fn backward(&self, dims: GrnDims, mut bufs: BackwardBuffers<'_, T>) -> Result<()> {
        if Self::serial(&dims) {
            return GrnKernel::<T>::backward(&CpuKernel, dims, bufs);
        }
        bufs.validate(&dims)?;
        let dim = dims.sample_dim();
        let (channels, spatial) = (dims.channels, dims.spatial);

        bufs.bottom_diff
            .par_chunks_mut(dim)
            .zip(bufs.dot.par_chunks_mut(spatial))
            .zip(bufs.temp.par_chunks_mut(dim))
            .zip(bufs.top_diff.par_chunks(dim))
            .zip(bufs.top_data.par_chunks(dim))
            .zip(bufs.bottom_data.par_chunks(dim))
            .zip(bufs.norm.par_chunks(spatial))
            .for_each(|((((((bottom_diff, dot), temp), top_diff), top_data), bottom_data), norm)| {
                backward_sample(
                    top_diff, top_data, bottom_data, norm, bottom_diff, dot, temp, channels,
                    spatial,
                );
            });
        Ok(())
    }
}
