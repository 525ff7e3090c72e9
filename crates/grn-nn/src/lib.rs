//! # grn-nn
//!
//! Global Response Normalization as a host-runtime layer.

pub mod layer;
pub mod config;
pub mod grn;
pub mod prelude;

pub use layer::Layer;
pub use config::GrnConfig;
pub use grn::GrnLayer;
pub use grn_kernels::Backend;
