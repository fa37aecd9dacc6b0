//! Triangle mesh in a periodic box

use crate::density::{run_kde, DensityKernel};
use crate::error::{MeshError, Result};
use crate::mesh::types::{faces_to_flat, points_to_flat, Dimensionality, Face, Point};
use crate::mesh::{MeshView, TriMesh};
use crate::periodic::bbox::PeriodicBox;
use crate::periodic::duplicate::{create_duplicates, regenerate_ghosts, DuplicateOrigin, Duplication};
use std::collections::HashMap;

/// Stage of the periodic pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeriodicState {
    /// No bounding box yet
    Unconfigured,
    /// Box set; vertices not (or no longer) known to be wrapped
    BoxSet,
    /// Vertices wrapped into the box
    Wrapped,
    /// Ghost vertices and trimmed faces available
    Duplicated,
}

/// A mesh that is periodic in x and y (optionally z)
///
/// Wraps a plain [`TriMesh`] and tracks which generation of its vertex/face
/// arrays was wrapped and duplicated. Any later replacement of vertices or
/// faces drops the state back to [`PeriodicState::BoxSet`].
#[derive(Debug, Clone)]
pub struct TriMeshPeriodic {
    mesh: TriMesh,
    bbox: Option<PeriodicBox>,
    wrapped_axes: usize,
    wrapped_at: Option<u64>,
    duplicated_at: Option<u64>,
    duplication: Duplication,
}

impl TriMeshPeriodic {
    /// Wrap an existing mesh
    pub fn new(mut mesh: TriMesh) -> Self {
        mesh.set_name("TriMeshPeriodic");
        Self {
            mesh,
            bbox: None,
            wrapped_axes: 0,
            wrapped_at: None,
            duplicated_at: None,
            duplication: Duplication::default(),
        }
    }

    /// Create from a flat coordinate buffer of `n * dim` values
    pub fn from_flat(coords: &[f64], dim: usize) -> Result<Self> {
        Ok(Self::new(TriMesh::from_flat(coords, dim)?))
    }

    /// The underlying mesh
    pub fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    /// Mutable access to the underlying mesh
    ///
    /// Replacing vertices or faces through it invalidates wrapping and
    /// duplication.
    pub fn mesh_mut(&mut self) -> &mut TriMesh {
        &mut self.mesh
    }

    pub fn into_mesh(self) -> TriMesh {
        self.mesh
    }

    pub fn bbox(&self) -> Option<&PeriodicBox> {
        self.bbox.as_ref()
    }

    /// Current pipeline stage
    pub fn state(&self) -> PeriodicState {
        let generation = Some(self.mesh.generation());
        if self.bbox.is_none() {
            PeriodicState::Unconfigured
        } else if self.duplicated_at == generation {
            PeriodicState::Duplicated
        } else if self.wrapped_at == generation {
            PeriodicState::Wrapped
        } else {
            PeriodicState::BoxSet
        }
    }

    fn require(&self, needed: PeriodicState, operation: &str) -> Result<&PeriodicBox> {
        let state = self.state();
        match self.bbox.as_ref() {
            Some(bbox) if state >= needed => Ok(bbox),
            _ => Err(MeshError::ConfigurationError(format!(
                "{} requires state {:?}, mesh is {:?}",
                operation, needed, state
            ))),
        }
    }

    /// Set the periodic box
    ///
    /// Discards any previous wrapping and duplication.
    pub fn set_bbox(&mut self, bbox: PeriodicBox) -> Result<()> {
        bbox.validate()?;
        if bbox.dims > self.mesh.dimensionality().components() {
            return Err(MeshError::ConfigurationError(format!(
                "A {}-axis periodic box does not fit a {:?} mesh",
                bbox.dims,
                self.mesh.dimensionality()
            )));
        }

        log::info!("Periodic box set to {:?} .. {:?}", bbox.min, bbox.max);
        self.bbox = Some(bbox);
        self.wrapped_at = None;
        self.duplicated_at = None;
        self.duplication = Duplication::default();
        Ok(())
    }

    /// Set the periodic box from `[min_0..min_dims, max_0..max_dims]`
    pub fn set_bbox_flat(&mut self, values: &[f64], dims: usize) -> Result<()> {
        self.set_bbox(PeriodicBox::from_flat(values, dims)?)
    }

    /// Map every vertex into the box along the first `axes` axes (2 or 3)
    ///
    /// Calling it again on an already wrapped mesh does nothing.
    pub fn wrap_vertices(&mut self, axes: usize) -> Result<()> {
        let bbox = *self.require(PeriodicState::BoxSet, "wrap_vertices")?;
        if !(axes == 2 || axes == 3) || axes > bbox.dims {
            return Err(MeshError::ConfigurationError(format!(
                "Cannot wrap {} axes in a {}-axis periodic box",
                axes, bbox.dims
            )));
        }

        if self.state() >= PeriodicState::Wrapped && self.wrapped_axes == axes {
            return Ok(());
        }

        let wrapped: Vec<Point> = self
            .mesh
            .vertices()
            .iter()
            .map(|p| bbox.wrap_point(p, axes))
            .collect();

        let moved = wrapped
            .iter()
            .zip(self.mesh.vertices())
            .filter(|(a, b)| a != b)
            .count();

        if moved > 0 {
            self.mesh.set_vertices(wrapped)?;
        }
        log::info!("Wrapped {} of {} vertices into the periodic box", moved, self.mesh.nvertices());

        self.wrapped_axes = axes;
        self.wrapped_at = Some(self.mesh.generation());
        self.duplicated_at = None;
        Ok(())
    }

    /// Split faces into interior and boundary-crossing faces and create ghosts
    pub fn create_duplicate_vertices(&mut self) -> Result<()> {
        let bbox = *self.require(PeriodicState::Wrapped, "create_duplicate_vertices")?;

        let duplication = create_duplicates(self.mesh.vertices(), self.mesh.faces(), &bbox)?;

        log::info!(
            "Found {} periodic faces, created {} duplicate vertices",
            duplication.periodic_faces.len(),
            duplication.num_duplicates()
        );

        self.duplication = duplication;
        self.duplicated_at = Some(self.mesh.generation());
        Ok(())
    }

    /// Replace the faces (duplication must be redone afterwards)
    pub fn set_faces(&mut self, faces: Vec<Face>) -> Result<()> {
        self.mesh.set_faces(faces)
    }

    /// Take the faces and duplication map of another periodic mesh
    ///
    /// The other mesh must describe the same vertices in the same order (for
    /// example an earlier frame of a trajectory). Ghost positions are
    /// regenerated from this mesh's vertices. Requires this mesh to be
    /// wrapped and the other to be duplicated.
    pub fn adopt_faces(&mut self, other: &TriMeshPeriodic) -> Result<()> {
        let bbox = *self.require(PeriodicState::Wrapped, "adopt_faces")?;
        let source = other.duplication()?;

        let n = self.mesh.nvertices();
        let total = n + source.origins.len();
        for face in other.mesh.faces() {
            face.validate(n)?;
        }
        for face in &source.trimmed_faces {
            face.validate(total)?;
        }
        let ghosts = regenerate_ghosts(self.mesh.vertices(), &source.origins, &bbox)?;

        self.mesh.set_faces(other.mesh.faces().to_vec())?;
        self.duplication = Duplication {
            vertices: ghosts,
            ..source.clone()
        };

        let generation = Some(self.mesh.generation());
        self.wrapped_at = generation;
        self.duplicated_at = generation;
        Ok(())
    }

    /// Duplication data; fails unless the mesh is in the duplicated state
    pub fn duplication(&self) -> Result<&Duplication> {
        self.require(PeriodicState::Duplicated, "duplication data")?;
        Ok(&self.duplication)
    }

    /// Boundary-crossing faces over original vertices, flattened
    ///
    /// With `combined`, interior faces come first.
    pub fn periodic_faces(&self, combined: bool) -> Result<Vec<usize>> {
        let dup = self.duplication()?;
        Ok(concat_faces(&dup.interior_faces, &dup.periodic_faces, combined))
    }

    /// Boundary-crossing faces over ghost vertices, flattened
    ///
    /// With `combined`, interior faces come first.
    pub fn trimmed_faces(&self, combined: bool) -> Result<Vec<usize>> {
        let dup = self.duplication()?;
        Ok(concat_faces(&dup.interior_faces, &dup.trimmed_faces, combined))
    }

    /// Ghost vertex positions, flattened
    ///
    /// With `combined`, the original vertices come first, so indices in
    /// [`TriMeshPeriodic::trimmed_faces`] address the combined buffer.
    pub fn duplicated_vertices(&self, combined: bool) -> Result<Vec<f64>> {
        let dup = self.duplication()?;
        let mut flat = if combined {
            self.mesh.vertices_flat()
        } else {
            Vec::new()
        };
        flat.extend(points_to_flat(&dup.vertices));
        Ok(flat)
    }

    /// Source of every ghost vertex
    pub fn duplicate_origins(&self) -> Result<&[DuplicateOrigin]> {
        Ok(self.duplication()?.origins.as_slice())
    }

    /// Duplication map as `[orig0, wx0, wy0, orig1, ...]`
    pub fn duplicate_map_flat(&self) -> Result<Vec<i64>> {
        Ok(self
            .duplicate_origins()?
            .iter()
            .flat_map(|o| [o.original as i64, i64::from(o.wrap[0]), i64::from(o.wrap[1])])
            .collect())
    }

    /// Non-periodic patch: originals plus ghosts, interior plus trimmed faces
    ///
    /// Fields are carried over, each ghost taking its original's value.
    pub fn trimmed_patch(&self) -> Result<TriMesh> {
        let dup = self.duplication()?;

        let mut vertices = self.mesh.vertices().to_vec();
        vertices.extend(dup.vertices.iter().copied());

        let mut faces = dup.interior_faces.clone();
        faces.extend(dup.trimmed_faces.iter().copied());

        let mut patch = TriMesh::from_parts(vertices, faces, self.mesh.dimensionality())?;
        patch.set_name(format!("{}-trimmed", self.mesh.name()));

        for (name, values) in self.mesh.fields() {
            let mut extended = values.clone();
            extended.extend(dup.origins.iter().map(|o| values[o.original]));
            patch.set_field(name.clone(), extended)?;
        }

        Ok(patch)
    }

    /// Box whose periodic axes match the wrapped axes
    fn distance_box(&self) -> Result<PeriodicBox> {
        let mut bbox = *self.require(PeriodicState::BoxSet, "periodic kde")?;
        if self.state() >= PeriodicState::Wrapped {
            bbox.dims = self.wrapped_axes;
        }
        Ok(bbox)
    }

    /// Kernel density with minimum-image distances
    ///
    /// Same contract as [`TriMesh::kde`]; requires a bounding box.
    pub fn kde(
        &mut self,
        kernel: &DensityKernel,
        name: &str,
        ids: Option<&[usize]>,
    ) -> Result<Vec<f64>> {
        let bbox = self.distance_box()?;
        run_kde(&mut self.mesh, kernel, name, ids, None, Some(&bbox))
    }

    /// Periodic counterpart of [`TriMesh::kde_from_sources`]
    pub fn kde_from_sources(
        &mut self,
        kernel: &DensityKernel,
        name: &str,
        sources: &[usize],
    ) -> Result<Vec<f64>> {
        let bbox = self.distance_box()?;
        run_kde(&mut self.mesh, kernel, name, None, Some(sources), Some(&bbox))
    }
}

fn concat_faces(first: &[Face], second: &[Face], combined: bool) -> Vec<usize> {
    let mut flat = if combined {
        faces_to_flat(first)
    } else {
        Vec::new()
    };
    flat.extend(faces_to_flat(second));
    flat
}

impl MeshView for TriMeshPeriodic {
    fn name(&self) -> &str {
        self.mesh.name()
    }

    fn dimensionality(&self) -> Dimensionality {
        self.mesh.dimensionality()
    }

    fn vertices(&self) -> &[Point] {
        self.mesh.vertices()
    }

    fn faces(&self) -> &[Face] {
        self.mesh.faces()
    }

    fn fields(&self) -> &HashMap<String, Vec<f64>> {
        self.mesh.fields()
    }
}
