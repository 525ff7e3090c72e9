//! Global Response Normalization layer.
//!
//! Rescales the channel vector at every (sample, h, w) position by
//! `sqrt(bias + Σ_c x²)`:
//!
//! ```text
//! y[n][c][h][w] = x[n][c][h][w] / sqrt(bias + Σ_c' x[n][c'][h][w]²)
//! ```

use grn_core::{Blob, Element, GrnError, Result, Shape};
use grn_kernels::{Backend, BackwardBuffers, ForwardBuffers, GrnDims, GrnKernel};

use crate::config::GrnConfig;
use crate::layer::Layer;

/// GRN over (N, C, H, W) blobs, one bottom and one top.
///
/// The per-position norm computed by [`forward`](Layer::forward) is kept in
/// the layer and consumed by the next [`backward`](Layer::backward). One
/// forward must be followed by its matching backward before the next
/// forward overwrites that buffer.
#[derive(Debug)]
pub struct GrnLayer<T: Element> {
    config: GrnConfig,
    bias: T,
    kernel: Box<dyn GrnKernel<T>>,
    /// Bottom shape seen by the last reshape.
    shape: Shape,
    /// x² during forward, x·dot during backward. (N, C, H, W)
    squares: Blob<T>,
    /// sqrt(bias + Σ_c x²). (N, 1, H, W)
    norm: Blob<T>,
    /// Σ_c dy·y / norm². (N, 1, H, W)
    dot: Blob<T>,
    /// Channel reduction vector. (1, C, 1, 1)
    ones: Blob<T>,
}

impl<T: Element> GrnLayer<T> {
    /// Validate `config` and build the layer. A negative or NaN bias is
    /// rejected.
    pub fn new(config: GrnConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            bias: T::from_f64_lossy(config.bias),
            kernel: config.backend.kernel(),
            config,
            shape: Shape::default(),
            squares: Blob::default(),
            norm: Blob::default(),
            dot: Blob::default(),
            ones: Blob::default(),
        })
    }

    pub fn config(&self) -> &GrnConfig {
        &self.config
    }

    pub fn bias(&self) -> T {
        self.bias
    }

    pub fn backend(&self) -> Backend {
        self.config.backend
    }

    /// Norm recorded by the last forward pass, shaped (N, 1, H, W).
    pub fn norm(&self) -> &Blob<T> {
        &self.norm
    }

    /// Scratch dot products from the last backward pass, shaped (N, 1, H, W).
    pub fn dot(&self) -> &Blob<T> {
        &self.dot
    }

    /// Total scratch capacity in elements, across all internal buffers.
    pub fn scratch_capacity(&self) -> usize {
        self.squares.capacity() + self.norm.capacity() + self.dot.capacity() + self.ones.capacity()
    }

    fn dims(&self) -> GrnDims {
        GrnDims::new(self.shape.num(), self.shape.channels(), self.shape.spatial_dim())
    }
}

impl<T: Element> Layer<T> for GrnLayer<T> {
    fn layer_type(&self) -> &'static str {
        "GRN"
    }

    fn exact_num_bottom_blobs(&self) -> Option<usize> {
        Some(1)
    }

    fn exact_num_top_blobs(&self) -> Option<usize> {
        Some(1)
    }

    fn layer_setup(&mut self, _bottom: &[&Blob<T>], _top: &mut [&mut Blob<T>]) -> Result<()> {
        tracing::info!(
            bias = self.config.bias,
            backend = %self.config.backend,
            dtype = %T::DTYPE,
            "GRN layer set up"
        );
        if self.config.bias == 0.0 {
            tracing::warn!("GRN bias is 0: all-zero channel vectors will produce non-finite output");
        }
        Ok(())
    }

    fn reshape(&mut self, bottom: &[&Blob<T>], top: &mut [&mut Blob<T>]) -> Result<()> {
        self.check_blob_counts(bottom.len(), top.len())?;
        let input = bottom[0];
        input.shape().check_legacy()?;

        let (num, channels) = (input.num(), input.channels());
        let (height, width) = (input.height(), input.width());

        let mut grew = top[0].reshape_like(input);
        grew |= self.ones.reshape(&[1, channels, 1, 1]);
        self.ones.fill_data(T::one());
        grew |= self.squares.reshape(&[num, channels, height, width]);
        grew |= self.norm.reshape(&[num, 1, height, width]);
        grew |= self.dot.reshape(&[num, 1, height, width]);
        self.shape = input.shape().clone();

        tracing::debug!(shape = %self.shape, grew, "GRN reshape");
        Ok(())
    }

    fn forward(&mut self, bottom: &[&Blob<T>], top: &mut [&mut Blob<T>]) -> Result<()> {
        self.check_blob_counts(bottom.len(), top.len())?;
        let input = bottom[0];
        input.expect_shape(&self.shape)?;
        top[0].expect_shape(&self.shape)?;

        let dims = self.dims();
        tracing::trace!(?dims, kernel = self.kernel.name(), "GRN forward");
        self.kernel.forward(
            dims,
            self.bias,
            ForwardBuffers {
                bottom: input.data(),
                top: top[0].data_mut(),
                squares: self.squares.data_mut(),
                norm: self.norm.data_mut(),
                ones: self.ones.data(),
            },
        )
    }

    fn backward(
        &mut self,
        top: &[&Blob<T>],
        propagate_down: &[bool],
        bottom: &mut [&mut Blob<T>],
    ) -> Result<()> {
        self.check_blob_counts(bottom.len(), top.len())?;
        if propagate_down.len() != bottom.len() {
            return Err(GrnError::BlobCount {
                layer: self.layer_type(),
                kind: "propagate_down",
                expected: bottom.len(),
                got: propagate_down.len(),
            });
        }
        if !propagate_down[0] {
            return Ok(());
        }

        let output = top[0];
        output.expect_shape(&self.shape)?;
        bottom[0].expect_shape(&self.shape)?;

        let dims = self.dims();
        tracing::trace!(?dims, kernel = self.kernel.name(), "GRN backward");
        let (bottom_data, bottom_diff) = bottom[0].data_and_diff_mut();
        self.kernel.backward(
            dims,
            BackwardBuffers {
                top_diff: output.diff(),
                top_data: output.data(),
                bottom_data,
                norm: self.norm.data(),
                bottom_diff,
                dot: self.dot.data_mut(),
                temp: self.squares.data_mut(),
            },
        )
    }
}
