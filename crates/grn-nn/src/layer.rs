use grn_core::{Blob, Element, GrnError, Result};

/// Base trait for layers driven by a host network runtime.
///
/// The runtime owns every blob. It calls [`setup`](Layer::setup) once,
/// [`reshape`](Layer::reshape) whenever input shapes change, then alternates
/// [`forward`](Layer::forward) and [`backward`](Layer::backward).
pub trait Layer<T: Element>: Send + Sync {
    /// Registry name of this layer type.
    fn layer_type(&self) -> &'static str;

    /// Required number of bottom (input) blobs, if fixed.
    fn exact_num_bottom_blobs(&self) -> Option<usize> {
        None
    }

    /// Required number of top (output) blobs, if fixed.
    fn exact_num_top_blobs(&self) -> Option<usize> {
        None
    }

    /// One-time initialization: checks blob counts, runs
    /// [`layer_setup`](Layer::layer_setup), then reshapes.
    fn setup(&mut self, bottom: &[&Blob<T>], top: &mut [&mut Blob<T>]) -> Result<()> {
        self.check_blob_counts(bottom.len(), top.len())?;
        self.layer_setup(bottom, top)?;
        self.reshape(bottom, top)
    }

    /// Layer-specific initialization.
    fn layer_setup(&mut self, _bottom: &[&Blob<T>], _top: &mut [&mut Blob<T>]) -> Result<()> {
        Ok(())
    }

    /// Size tops and internal buffers for the current bottom shapes.
    fn reshape(&mut self, bottom: &[&Blob<T>], top: &mut [&mut Blob<T>]) -> Result<()>;

    /// Compute top data from bottom data.
    fn forward(&mut self, bottom: &[&Blob<T>], top: &mut [&mut Blob<T>]) -> Result<()>;

    /// Compute bottom diffs from top diffs.
    ///
    /// `propagate_down[i]` says whether `bottom[i]` wants a gradient; when it
    /// is `false` that bottom's diff must be left untouched.
    fn backward(
        &mut self,
        top: &[&Blob<T>],
        propagate_down: &[bool],
        bottom: &mut [&mut Blob<T>],
    ) -> Result<()>;

    /// Validate bottom/top counts against the layer's requirements.
    fn check_blob_counts(&self, bottoms: usize, tops: usize) -> Result<()> {
        if let Some(expected) = self.exact_num_bottom_blobs() {
            if bottoms != expected {
                return Err(GrnError::BlobCount {
                    layer: self.layer_type(),
                    kind: "bottom",
                    expected,
                    got: bottoms,
                });
            }
        }
        if let Some(expected) = self.exact_num_top_blobs() {
            if tops != expected {
                return Err(GrnError::BlobCount {
                    layer: self.layer_type(),
                    kind: "top",
                    expected,
                    got: tops,
                });
            }
        }
        Ok(())
    }
}
