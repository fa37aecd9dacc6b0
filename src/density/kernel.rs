//! Density kernel definitions

use crate::error::{MeshError, Result};
use serde::{Deserialize, Serialize};

/// Shape of a distance-decaying density kernel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelShape {
    /// `exp(-d² / 2h²)`
    #[default]
    Gaussian,
    /// `max(0, 1 - d² / h²)`, zero beyond the bandwidth
    Epanechnikov,
}

/// Kernel used for density estimation
///
/// Kernels are unnormalized: every shape evaluates to 1 at zero distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityKernel {
    /// Kernel shape
    #[serde(default)]
    pub shape: KernelShape,

    /// Bandwidth `h` (Gaussian sigma, Epanechnikov radius)
    pub bandwidth: f64,

    /// Only count vertices within this many mesh hops of the query vertex
    #[serde(default)]
    pub max_hops: Option<usize>,

    /// Ignore contributions beyond this many bandwidths
    #[serde(default)]
    pub cutoff: Option<f64>,
}

impl Default for DensityKernel {
    fn default() -> Self {
        Self {
            shape: KernelShape::Gaussian,
            bandwidth: 1.0,
            max_hops: None,
            cutoff: None,
        }
    }
}

impl DensityKernel {
    /// Create a new kernel
    pub fn new(shape: KernelShape, bandwidth: f64) -> Self {
        Self {
            shape,
            bandwidth,
            ..Self::default()
        }
    }

    /// Gaussian kernel with standard deviation `sigma`
    pub fn gaussian(sigma: f64) -> Self {
        Self::new(KernelShape::Gaussian, sigma)
    }

    /// Epanechnikov kernel with radius `h`
    pub fn epanechnikov(h: f64) -> Self {
        Self::new(KernelShape::Epanechnikov, h)
    }

    /// Restrict contributions to vertices within `hops` mesh hops
    pub fn with_max_hops(mut self, hops: usize) -> Self {
        self.max_hops = Some(hops);
        self
    }

    /// Ignore contributions beyond `cutoff` bandwidths
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    /// Check that the bandwidth and cutoff are usable
    pub fn validate(&self) -> Result<()> {
        if !(self.bandwidth.is_finite() && self.bandwidth > 0.0) {
            return Err(MeshError::ConfigurationError(format!(
                "Kernel bandwidth must be positive and finite, got {}",
                self.bandwidth
            )));
        }

        if let Some(cutoff) = self.cutoff {
            if !(cutoff.is_finite() && cutoff > 0.0) {
                return Err(MeshError::ConfigurationError(format!(
                    "Kernel cutoff must be positive and finite, got {}",
                    cutoff
                )));
            }
        }

        Ok(())
    }

    /// Kernel value at distance `d`
    pub fn evaluate(&self, d: f64) -> f64 {
        if let Some(radius) = self.support_radius() {
            if d > radius {
                return 0.0;
            }
        }

        let u2 = (d / self.bandwidth).powi(2);
        match self.shape {
            KernelShape::Gaussian => (-0.5 * u2).exp(),
            KernelShape::Epanechnikov => (1.0 - u2).max(0.0),
        }
    }

    /// Distance beyond which the kernel is zero, if finite
    pub fn support_radius(&self) -> Option<f64> {
        let cutoff = self.cutoff.map(|c| c * self.bandwidth);
        match self.shape {
            KernelShape::Gaussian => cutoff,
            KernelShape::Epanechnikov => {
                Some(cutoff.map_or(self.bandwidth, |c| c.min(self.bandwidth)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_at_zero_is_one() {
        assert_relative_eq!(DensityKernel::gaussian(0.3).evaluate(0.0), 1.0);
        assert_relative_eq!(DensityKernel::epanechnikov(0.3).evaluate(0.0), 1.0);
    }

    #[test]
    fn test_gaussian_decay() {
        let k = DensityKernel::gaussian(1.0);

        assert_relative_eq!(k.evaluate(1.0), (-0.5f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(k.evaluate(2.0), (-2.0f64).exp(), epsilon = 1e-12);
        assert_eq!(k.support_radius(), None);
    }

    #[test]
    fn test_epanechnikov_support() {
        let k = DensityKernel::epanechnikov(2.0);

        assert_relative_eq!(k.evaluate(1.0), 0.75, epsilon = 1e-12);
        assert_eq!(k.evaluate(2.5), 0.0);
        assert_eq!(k.support_radius(), Some(2.0));
    }

    #[test]
    fn test_cutoff() {
        let k = DensityKernel::gaussian(0.5).with_cutoff(3.0);

        assert_eq!(k.support_radius(), Some(1.5));
        assert_eq!(k.evaluate(1.6), 0.0);
        assert!(k.evaluate(1.4) > 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(DensityKernel::gaussian(1.0).validate().is_ok());
        assert!(DensityKernel::gaussian(0.0).validate().is_err());
        assert!(DensityKernel::gaussian(f64::NAN).validate().is_err());
        assert!(DensityKernel::gaussian(1.0).with_cutoff(-1.0).validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let k: DensityKernel = serde_json::from_str(r#"{"bandwidth": 0.8}"#).unwrap();

        assert_eq!(k.shape, KernelShape::Gaussian);
        assert_eq!(k.max_hops, None);

        let k: DensityKernel =
            serde_json::from_str(r#"{"shape": "epanechnikov", "bandwidth": 2.0, "max_hops": 3}"#)
                .unwrap();
        assert_eq!(k.shape, KernelShape::Epanechnikov);
        assert_eq!(k.max_hops, Some(3));
    }
}
