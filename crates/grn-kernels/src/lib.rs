//! # grn-kernels
//!
//! CPU kernels for Global Response Normalization.
//!
//! Provides:
//! - BLAS-style slice primitives (`math`)
//! - Per-sample GRN forward/backward and the `GrnKernel` trait (`grn`)
//! - A serial reference kernel and a rayon batch-parallel kernel
//! - `Backend` selection for configuration files

pub mod math;
pub mod grn;
pub mod backend;

pub use backend::Backend;
pub use grn::{BackwardBuffers, CpuKernel, ForwardBuffers, GrnDims, GrnKernel, ParallelKernel};
