//! Kernel selection.

use std::fmt;

use serde::{Deserialize, Serialize};

use grn_core::Element;

use crate::grn::{CpuKernel, GrnKernel, ParallelKernel};

/// Compute capability a GRN layer runs on, chosen at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Serial loop over the batch.
    #[default]
    Cpu,
    /// Batch split across the rayon thread pool.
    Parallel,
}

impl Backend {
    /// Build the kernel for this backend.
    pub fn kernel<T: Element>(&self) -> Box<dyn GrnKernel<T>> {
        match self {
            Backend::Cpu => Box::new(CpuKernel),
            Backend::Parallel => Box::new(ParallelKernel),
        }
    }

    /// Worker threads this backend will use.
    pub fn threads(&self) -> usize {
        match self {
            Backend::Cpu => 1,
            Backend::Parallel => rayon::current_num_threads(),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Cpu => write!(f, "cpu"),
            Backend::Parallel => write!(f, "parallel"),
        }
    }
}
