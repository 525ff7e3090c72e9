//! # grn-core
//!
//! Buffers shared by the GRN kernels and layers.
//!
//! Provides:
//! - `Blob`: a 4-D (num, channels, height, width) data/diff buffer pair
//! - `Shape` with legacy N/C/H/W accessors and bounds-checked offsets
//! - Grow-only `Storage` so reshapes reuse memory
//! - `f32` and `f64` elements through the `Element` trait
//! - Seeded fillers for tests and benchmarks

pub mod dtype;
pub mod storage;
pub mod shape;
pub mod blob;
pub mod filler;
pub mod error;
pub mod prelude;

pub use dtype::{DType, Element};
pub use storage::Storage;
pub use shape::Shape;
pub use blob::Blob;
pub use error::GrnError;

pub type Result<T> = std::result::Result<T, GrnError>;
