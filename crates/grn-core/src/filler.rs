//! Blob fillers for initializing test inputs and benchmark data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::blob::Blob;
use crate::dtype::Element;
use crate::error::GrnError;
use crate::Result;

/// Something that can populate the `data` half of a blob.
pub trait Filler<T: Element> {
    fn fill(&mut self, blob: &mut Blob<T>);
}

/// Uniform values in `[low, high)`.
#[derive(Debug, Clone)]
pub struct UniformFiller {
    low: f64,
    high: f64,
    rng: StdRng,
}

impl UniformFiller {
    pub fn new(low: f64, high: f64, seed: u64) -> Result<Self> {
        if low.is_nan() || high.is_nan() || low >= high {
            return Err(GrnError::InvalidConfig(format!(
                "uniform filler needs low < high, got [{low}, {high})"
            )));
        }
        Ok(Self {
            low,
            high,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl<T: Element> Filler<T> for UniformFiller {
    fn fill(&mut self, blob: &mut Blob<T>) {
        let (low, high) = (self.low, self.high);
        for v in blob.data_mut() {
            *v = T::from_f64_lossy(self.rng.gen_range(low..high));
        }
    }
}

/// Normally distributed values N(mean, std²).
#[derive(Debug, Clone)]
pub struct GaussianFiller {
    mean: f64,
    std: f64,
    rng: StdRng,
}

impl GaussianFiller {
    pub fn new(mean: f64, std: f64, seed: u64) -> Self {
        Self {
            mean,
            std,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn sample(&mut self) -> f64 {
        // Box-Muller transform
        let u1: f64 = self.rng.gen_range(1e-12f64..1.0f64);
        let u2: f64 = self.rng.gen_range(0.0f64..std::f64::consts::TAU);
        self.mean + self.std * (-2.0 * u1.ln()).sqrt() * u2.cos()
    }
}

impl<T: Element> Filler<T> for GaussianFiller {
    fn fill(&mut self, blob: &mut Blob<T>) {
        for v in blob.data_mut() {
            *v = T::from_f64_lossy(self.sample());
        }
    }
}
