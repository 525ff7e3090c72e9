//! GRN layer configuration.

use serde::{Deserialize, Serialize};

use grn_core::{GrnError, Result};
use grn_kernels::Backend;

/// Parameters of a [`GrnLayer`](crate::GrnLayer).
///
/// Missing fields take their defaults when deserialized; unknown fields are
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrnConfig {
    /// Added to the squared channel sum before the square root. Must be
    /// non-negative. With a bias of 0, an all-zero channel vector divides by
    /// zero and produces non-finite output.
    pub bias: f64,

    /// Kernel the layer runs on.
    pub backend: Backend,
}

impl Default for GrnConfig {
    fn default() -> Self {
        Self {
            bias: 1.0,
            backend: Backend::Cpu,
        }
    }
}

impl GrnConfig {
    /// Config with the given bias on the serial CPU kernel.
    pub fn new(bias: f64) -> Self {
        Self {
            bias,
            ..Self::default()
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Check `bias >= 0`. NaN fails too.
    pub fn validate(&self) -> Result<()> {
        if self.bias.is_nan() || self.bias < 0.0 {
            return Err(GrnError::InvalidConfig(format!(
                "GRN bias must be >= 0, got {}",
                self.bias
            )));
        }
        Ok(())
    }
}
