//! Convenience re-exports for common grn-core types.
//!
//! ```rust
//! use grn_core::prelude::*;
//! ```

pub use crate::filler::{Filler, GaussianFiller, UniformFiller};
pub use crate::Blob;
pub use crate::DType;
pub use crate::Element;
pub use crate::GrnError;
pub use crate::Result;
pub use crate::Shape;
