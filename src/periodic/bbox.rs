//! Periodic bounding box

use crate::error::{MeshError, Result};
use crate::mesh::types::{Point, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned periodic box
///
/// Only the first `dims` axes are periodic; for those `min[d] < max[d]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodicBox {
    /// Lower corner
    pub min: [f64; 3],

    /// Upper corner (exclusive for wrapped coordinates)
    pub max: [f64; 3],

    /// Number of periodic axes (2 = xy, 3 = xyz)
    #[serde(default = "default_dims")]
    pub dims: usize,
}

fn default_dims() -> usize {
    2
}

impl PeriodicBox {
    /// Create a validated box
    pub fn new(min: [f64; 3], max: [f64; 3], dims: usize) -> Result<Self> {
        let bbox = Self { min, max, dims };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Create a box from `[min_0..min_dims, max_0..max_dims]`
    pub fn from_flat(values: &[f64], dims: usize) -> Result<Self> {
        if !(dims == 2 || dims == 3) || values.len() != 2 * dims {
            return Err(MeshError::ConfigurationError(format!(
                "Bounding box needs {} values for {} periodic axes, got {}",
                2 * dims,
                dims,
                values.len()
            )));
        }

        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        min[..dims].copy_from_slice(&values[..dims]);
        max[..dims].copy_from_slice(&values[dims..]);
        Self::new(min, max, dims)
    }

    /// Check axis count and that every periodic axis has positive extent
    pub fn validate(&self) -> Result<()> {
        if !(self.dims == 2 || self.dims == 3) {
            return Err(MeshError::ConfigurationError(format!(
                "Periodic box must have 2 or 3 axes, got {}",
                self.dims
            )));
        }

        for d in 0..self.dims {
            let (lo, hi) = (self.min[d], self.max[d]);
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(MeshError::ConfigurationError(format!(
                    "Invalid bounding box on axis {}: min {} must be below max {}",
                    d, lo, hi
                )));
            }
        }

        Ok(())
    }

    /// Box length along axis `d`
    pub fn extent(&self, d: usize) -> f64 {
        self.max[d] - self.min[d]
    }

    /// Map a coordinate into `[min[d], max[d])`
    pub fn wrap_coordinate(&self, d: usize, x: f64) -> f64 {
        let extent = self.extent(d);
        let wrapped = self.min[d] + (x - self.min[d]).rem_euclid(extent);

        // rem_euclid can round up to exactly the extent for tiny negatives
        if wrapped >= self.max[d] {
            self.min[d]
        } else {
            wrapped
        }
    }

    /// Wrap the first `axes` coordinates of a point
    pub fn wrap_point(&self, p: &Point, axes: usize) -> Point {
        let mut q = *p;
        for d in 0..axes.min(self.dims) {
            q[d] = self.wrap_coordinate(d, p[d]);
        }
        q
    }

    /// Check whether a point lies inside the box on the first `axes` axes
    pub fn contains(&self, p: &Point, axes: usize) -> bool {
        (0..axes.min(self.dims)).all(|d| p[d] >= self.min[d] && p[d] < self.max[d])
    }

    /// Shortest periodic image of a displacement
    pub fn minimum_image(&self, delta: &Vec3) -> Vec3 {
        let mut v = *delta;
        for d in 0..self.dims {
            let extent = self.extent(d);
            v[d] -= extent * (v[d] / extent).round();
        }
        v
    }

    /// Distance between two points under the minimum image convention
    pub fn periodic_distance(&self, a: &Point, b: &Point) -> f64 {
        self.minimum_image(&(b - a)).norm()
    }

    /// Check whether a displacement along axis `d` exceeds half the box
    pub fn crosses_half(&self, d: usize, delta: f64) -> bool {
        delta.abs() > 0.5 * self.extent(d)
    }
}
