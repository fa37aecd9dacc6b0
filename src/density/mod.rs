//! Kernel density estimation over mesh vertices
//!
//! Densities are stored as named per-vertex fields. A query vertex always
//! counts its own zero-distance contribution, so an isolated vertex has
//! density `kernel(0) = 1`.

pub mod estimate;
pub mod kernel;

pub use estimate::DensityEstimator;
pub use kernel::{DensityKernel, KernelShape};

use crate::error::{MeshError, Result};
use crate::mesh::{MeshView, TriMesh};
use crate::periodic::PeriodicBox;

/// Check every id against the vertex count
pub(crate) fn validate_ids(ids: &[usize], num_vertices: usize, context: &str) -> Result<()> {
    match ids.iter().find(|&&id| id >= num_vertices) {
        Some(&id) => Err(MeshError::invalid_index(id, num_vertices, context)),
        None => Ok(()),
    }
}

/// Evaluate a density field and store it on the mesh
///
/// `queries` selects where the density is evaluated and `sources` which
/// vertices contribute (all vertices when `None`). Vertices that are not
/// queried hold 0 in the stored field. Nothing is modified on error.
pub(crate) fn run_kde(
    mesh: &mut TriMesh,
    kernel: &DensityKernel,
    name: &str,
    queries: Option<&[usize]>,
    sources: Option<&[usize]>,
    periodic: Option<&PeriodicBox>,
) -> Result<Vec<f64>> {
    kernel.validate()?;

    let n = mesh.nvertices();
    if let Some(ids) = queries {
        validate_ids(ids, n, "density query ids")?;
    }
    if let Some(ids) = sources {
        validate_ids(ids, n, "density source ids")?;
    }

    let queries: Vec<usize> = match queries {
        Some(ids) => ids.to_vec(),
        None => (0..n).collect(),
    };

    log::info!(
        "Computing density '{}' at {} vertices ({:?}, bandwidth {})",
        name,
        queries.len(),
        kernel.shape,
        kernel.bandwidth
    );

    let values = {
        let (neighbors, vertices) = if kernel.max_hops.is_some() {
            let (neighbors, vertices) = mesh.neighbors_with_vertices();
            (Some(neighbors), vertices)
        } else {
            (None, mesh.vertices())
        };

        DensityEstimator::new(vertices, kernel, sources, neighbors, periodic).evaluate(&queries)
    };

    let mut field = vec![0.0; n];
    for (&q, &value) in queries.iter().zip(values.iter()) {
        field[q] = value;
    }

    mesh.set_field(name, field.clone())?;
    Ok(field)
}

impl TriMesh {
    /// Kernel density at the vertices in `ids` (all vertices when `None`)
    ///
    /// Every vertex contributes, within the kernel's hop limit if it has one.
    /// The full per-vertex field is stored under `name`, replacing any
    /// previous field of that name, and returned.
    pub fn kde(
        &mut self,
        kernel: &DensityKernel,
        name: &str,
        ids: Option<&[usize]>,
    ) -> Result<Vec<f64>> {
        run_kde(self, kernel, name, ids, None, None)
    }

    /// Kernel density of the vertices in `sources`, evaluated at every vertex
    ///
    /// Used to map the local concentration of a subset of points (such as
    /// one lipid species) over the whole mesh.
    pub fn kde_from_sources(
        &mut self,
        kernel: &DensityKernel,
        name: &str,
        sources: &[usize],
    ) -> Result<Vec<f64>> {
        run_kde(self, kernel, name, None, Some(sources), None)
    }
}
