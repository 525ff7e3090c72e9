//! Convenience re-exports for building and driving GRN layers.

pub use crate::Backend;
pub use crate::GrnConfig;
pub use crate::GrnLayer;
pub use crate::Layer;
pub use grn_core::prelude::*;
