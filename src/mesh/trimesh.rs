//! Triangle mesh store with lazily computed, generation-stamped connectivity

use crate::error::{MeshError, Result};
use crate::mesh::adjacency::Adjacency;
use crate::mesh::connectivity::{
    build_across_edge, build_adjacent_faces, build_boundary_edges, build_neighbors, AcrossEdge,
    ManifoldPolicy,
};
use crate::mesh::derived::{compute_normals, compute_point_areas, compute_total_area, Normals};
use crate::mesh::types::{
    faces_from_flat, faces_to_flat, points_from_flat, points_to_flat, vectors_to_flat,
    Dimensionality, Edge, Face, Point, Vec3,
};
use std::collections::HashMap;

/// Field name under which point areas are stored
pub const AREA_FIELD: &str = "area";

/// Read access to a mesh, sufficient for writers and external collaborators
pub trait MeshView {
    /// Mesh name
    fn name(&self) -> &str;

    /// Planar or surface mesh
    fn dimensionality(&self) -> Dimensionality;

    /// Vertex positions
    fn vertices(&self) -> &[Point];

    /// Triangle faces
    fn faces(&self) -> &[Face];

    /// Named per-vertex scalar fields
    fn fields(&self) -> &HashMap<String, Vec<f64>>;

    /// Get total number of vertices
    fn nvertices(&self) -> usize {
        self.vertices().len()
    }

    /// Get total number of faces
    fn nfaces(&self) -> usize {
        self.faces().len()
    }

    /// Look up a field by name
    fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields().get(name).map(Vec::as_slice)
    }

    /// Vertices as `[x0, y0, z0, x1, ...]`
    fn vertices_flat(&self) -> Vec<f64> {
        points_to_flat(self.vertices())
    }

    /// Faces as `[a0, b0, c0, a1, ...]`
    fn faces_flat(&self) -> Vec<usize> {
        faces_to_flat(self.faces())
    }
}

/// A value computed for one generation of the vertex/face arrays
#[derive(Debug, Clone)]
struct Memo<T> {
    slot: Option<(u64, T)>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> Memo<T> {
    fn get_or_insert_with(&mut self, generation: u64, build: impl FnOnce() -> T) -> &T {
        let value = match self.slot.take() {
            Some((g, value)) if g == generation => value,
            _ => build(),
        };
        &self.slot.insert((generation, value)).1
    }

    fn get_or_try_insert_with(
        &mut self,
        generation: u64,
        build: impl FnOnce() -> Result<T>,
    ) -> Result<&T> {
        let value = match self.slot.take() {
            Some((g, value)) if g == generation => value,
            _ => build()?,
        };
        Ok(&self.slot.insert((generation, value)).1)
    }

    fn clear(&mut self) {
        self.slot = None;
    }
}

#[derive(Debug, Clone, Default)]
struct Caches {
    neighbors: Memo<Adjacency>,
    adjacent_faces: Memo<Adjacency>,
    across_edge: Memo<AcrossEdge>,
    boundary_edges: Memo<Vec<Edge>>,
    normals: Memo<Normals>,
    point_areas: Memo<Vec<f64>>,
}

/// Triangle mesh: vertices, faces and named per-vertex fields
///
/// Connectivity and derived quantities are computed on first request and
/// cached against a generation counter. The counter advances whenever the
/// vertex or face arrays are replaced (or on an explicit [`TriMesh::rebuild`]),
/// which makes every cached value stale at once.
#[derive(Debug, Clone)]
pub struct TriMesh {
    name: String,
    dim: Dimensionality,
    vertices: Vec<Point>,
    faces: Vec<Face>,
    fields: HashMap<String, Vec<f64>>,
    manifold_policy: ManifoldPolicy,
    generation: u64,
    cache: Caches,
}

impl TriMesh {
    /// Create a new empty surface mesh
    pub fn new() -> Self {
        Self::with_name("TriMesh", Dimensionality::Surface)
    }

    /// Create a new empty mesh with a name and dimensionality
    pub fn with_name(name: impl Into<String>, dim: Dimensionality) -> Self {
        Self {
            name: name.into(),
            dim,
            vertices: Vec::new(),
            faces: Vec::new(),
            fields: HashMap::new(),
            manifold_policy: ManifoldPolicy::default(),
            generation: 0,
            cache: Caches::default(),
        }
    }

    /// Create a mesh from points (no faces yet)
    ///
    /// Planar meshes have their third coordinate forced to 0.
    pub fn from_points(points: Vec<Point>, dim: Dimensionality) -> Self {
        let mut mesh = Self::with_name("TriMesh", dim);
        mesh.vertices = match dim {
            Dimensionality::Planar => points
                .into_iter()
                .map(|p| Point::new(p.x, p.y, 0.0))
                .collect(),
            Dimensionality::Surface => points,
        };
        mesh
    }

    /// Create a mesh from a flat coordinate buffer of `n * dim` values
    pub fn from_flat(coords: &[f64], dim: usize) -> Result<Self> {
        let dim = Dimensionality::from_components(dim)?;
        let points = points_from_flat(coords, dim)?;
        Ok(Self::from_points(points, dim))
    }

    /// Create a mesh from vertices and faces
    pub fn from_parts(vertices: Vec<Point>, faces: Vec<Face>, dim: Dimensionality) -> Result<Self> {
        let mut mesh = Self::from_points(vertices, dim);
        mesh.set_faces(faces)?;
        Ok(mesh)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Current generation of the vertex/face arrays
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the vertex array
    ///
    /// Fails without modifying the mesh if existing faces reference vertices
    /// beyond the new array. Fields whose length no longer matches the vertex
    /// count are dropped.
    pub fn set_vertices(&mut self, vertices: Vec<Point>) -> Result<()> {
        for face in &self.faces {
            face.validate(vertices.len())?;
        }

        let n = vertices.len();
        self.fields.retain(|name, values| {
            let keep = values.len() == n;
            if !keep {
                log::warn!("Dropping field '{}' after vertex count changed", name);
            }
            keep
        });

        self.vertices = vertices;
        self.rebuild();
        Ok(())
    }

    /// Replace the face array
    ///
    /// Every face is validated before anything is modified.
    pub fn set_faces(&mut self, faces: Vec<Face>) -> Result<()> {
        for face in &faces {
            face.validate(self.vertices.len())?;
        }

        self.faces = faces;
        self.rebuild();
        Ok(())
    }

    /// Replace the face array from a flat index buffer of `n * 3` values
    pub fn set_faces_flat(&mut self, indices: &[usize]) -> Result<()> {
        self.set_faces(faces_from_flat(indices)?)
    }

    /// Copy the faces of another mesh over the same vertex ordering
    pub fn set_faces_from(&mut self, other: &TriMesh) -> Result<()> {
        self.set_faces(other.faces.clone())
    }

    /// Invalidate every cached connectivity and derived quantity
    ///
    /// Named fields are kept.
    pub fn rebuild(&mut self) {
        self.generation += 1;
        log::debug!("Mesh '{}' advanced to generation {}", self.name, self.generation);
    }

    /// Set how edges shared by more than two faces are handled
    pub fn set_manifold_policy(&mut self, policy: ManifoldPolicy) {
        if self.manifold_policy != policy {
            self.manifold_policy = policy;
            self.cache.across_edge.clear();
            self.cache.boundary_edges.clear();
        }
    }

    pub fn manifold_policy(&self) -> ManifoldPolicy {
        self.manifold_policy
    }

    /// Store a named per-vertex field, replacing any field of the same name
    pub fn set_field(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.vertices.len() {
            return Err(MeshError::InvalidMeshTopology(format!(
                "Field '{}' has {} values for {} vertices",
                name,
                values.len(),
                self.vertices.len()
            )));
        }

        self.fields.insert(name, values);
        Ok(())
    }

    /// Remove a named field, returning its values
    pub fn remove_field(&mut self, name: &str) -> Option<Vec<f64>> {
        self.fields.remove(name)
    }

    /// For each vertex, the vertices sharing a face with it
    pub fn neighbors(&mut self) -> &Adjacency {
        let n = self.vertices.len();
        let faces = &self.faces;
        self.cache
            .neighbors
            .get_or_insert_with(self.generation, || build_neighbors(n, faces))
    }

    /// Neighbor lists together with the vertex array they index
    pub(crate) fn neighbors_with_vertices(&mut self) -> (&Adjacency, &[Point]) {
        let n = self.vertices.len();
        let faces = &self.faces;
        let neighbors = self
            .cache
            .neighbors
            .get_or_insert_with(self.generation, || build_neighbors(n, faces));
        (neighbors, &self.vertices)
    }

    /// For each vertex, the faces containing it
    pub fn adjacent_faces(&mut self) -> &Adjacency {
        let n = self.vertices.len();
        let faces = &self.faces;
        self.cache
            .adjacent_faces
            .get_or_insert_with(self.generation, || build_adjacent_faces(n, faces))
    }

    /// For each face, the faces across its three edges
    ///
    /// Only fails under [`ManifoldPolicy::Strict`]; the cache is left empty
    /// in that case.
    pub fn across_edge(&mut self) -> Result<&AcrossEdge> {
        let generation = self.generation;
        let n = self.vertices.len();
        let faces = &self.faces;
        let policy = self.manifold_policy;

        let adjacent = self
            .cache
            .adjacent_faces
            .get_or_insert_with(generation, || build_adjacent_faces(n, faces));

        self.cache
            .across_edge
            .get_or_try_insert_with(generation, || {
                build_across_edge(faces, adjacent, policy)
            })
    }

    /// Edges that belong to exactly one face
    pub fn boundary_edges(&mut self) -> Result<&[Edge]> {
        let generation = self.generation;
        let n = self.vertices.len();
        let faces = &self.faces;
        let policy = self.manifold_policy;

        let adjacent = self
            .cache
            .adjacent_faces
            .get_or_insert_with(generation, || build_adjacent_faces(n, faces));
        let across = self
            .cache
            .across_edge
            .get_or_try_insert_with(generation, || {
                build_across_edge(faces, adjacent, policy)
            })?;
        let edges = self
            .cache
            .boundary_edges
            .get_or_insert_with(generation, || build_boundary_edges(faces, across));

        Ok(edges.as_slice())
    }

    /// Edges shared by more than two faces
    pub fn non_manifold_edges(&mut self) -> Result<&[Edge]> {
        Ok(self.across_edge()?.non_manifold.as_slice())
    }

    /// Check whether every edge is shared by exactly two faces
    pub fn is_closed(&mut self) -> Result<bool> {
        let closed = self.boundary_edges()?.is_empty();
        if !closed {
            log::debug!("Mesh '{}' is open", self.name);
        }
        Ok(closed)
    }

    fn normal_cache(&mut self) -> &Normals {
        let generation = self.generation;
        let n = self.vertices.len();
        let vertices = &self.vertices;
        let faces = &self.faces;

        let adjacent = self
            .cache
            .adjacent_faces
            .get_or_insert_with(generation, || build_adjacent_faces(n, faces));

        self.cache.normals.get_or_insert_with(generation, || {
            log::info!("Computing normals for {} faces", faces.len());
            compute_normals(vertices, faces, adjacent)
        })
    }

    /// Unit vertex normals (unweighted average of adjacent face normals)
    ///
    /// Isolated vertices get the zero vector.
    pub fn normals(&mut self) -> &[Vec3] {
        &self.normal_cache().vertex
    }

    /// Unit face normals; zero for degenerate faces
    pub fn face_normals(&mut self) -> &[Vec3] {
        &self.normal_cache().face
    }

    /// Vertex normals as `[x0, y0, z0, x1, ...]`
    pub fn normals_flat(&mut self) -> Vec<f64> {
        vectors_to_flat(self.normals())
    }

    /// Mixed Voronoi area of every vertex
    ///
    /// The result is also stored as the [`AREA_FIELD`] field.
    pub fn point_areas(&mut self) -> &[f64] {
        let generation = self.generation;
        let n = self.vertices.len();
        let vertices = &self.vertices;
        let faces = &self.faces;

        let adjacent = self
            .cache
            .adjacent_faces
            .get_or_insert_with(generation, || build_adjacent_faces(n, faces));

        let areas = self.cache.point_areas.get_or_insert_with(generation, || {
            log::info!("Computing point areas for {} vertices", n);
            compute_point_areas(vertices, faces, adjacent)
        });

        self.fields.insert(AREA_FIELD.to_string(), areas.clone());
        areas
    }

    /// Sum of all face areas
    pub fn total_area(&self) -> f64 {
        compute_total_area(&self.vertices, &self.faces)
    }
}

impl Default for TriMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshView for TriMesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensionality(&self) -> Dimensionality {
        self.dim
    }

    fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    fn faces(&self) -> &[Face] {
        &self.faces
    }

    fn fields(&self) -> &HashMap<String, Vec<f64>> {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_square() -> TriMesh {
        TriMesh::from_parts(
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(1.0, 1.0, 0.0),
                Point::new(0.0, 1.0, 0.0),
            ],
            vec![Face::new([0, 1, 2]), Face::new([0, 2, 3])],
            Dimensionality::Planar,
        )
        .unwrap()
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = TriMesh::from_flat(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], 2).unwrap();

        assert_eq!(mesh.nvertices(), 3);
        assert_eq!(mesh.nfaces(), 0);
        assert_eq!(mesh.dimensionality(), Dimensionality::Planar);
        assert_eq!(mesh.name(), "TriMesh");
    }

    #[test]
    fn test_set_faces_rejects_bad_index_without_mutation() {
        let mut mesh = make_square();
        let generation = mesh.generation();

        let result = mesh.set_faces_flat(&[0, 1, 2, 0, 2, 7]);

        assert!(matches!(result, Err(MeshError::InvalidIndex { index: 7, .. })));
        assert_eq!(mesh.nfaces(), 2);
        assert_eq!(mesh.generation(), generation);
    }

    #[test]
    fn test_set_vertices_checks_existing_faces() {
        let mut mesh = make_square();
        let result = mesh.set_vertices(vec![Point::origin(); 3]);

        assert!(result.is_err());
        assert_eq!(mesh.nvertices(), 4);
    }

    #[test]
    fn test_connectivity_cached_until_rebuild() {
        let mut mesh = make_square();

        let first = mesh.neighbors().clone();
        assert_eq!(mesh.neighbors(), &first);

        // Replacing faces invalidates the cache
        mesh.set_faces(vec![Face::new([0, 1, 2])]).unwrap();
        assert!(mesh.neighbors().get(3).is_empty());
        assert_eq!(mesh.boundary_edges().unwrap().len(), 3);
    }

    #[test]
    fn test_boundary_and_closed() {
        let mut mesh = make_square();

        assert_eq!(mesh.boundary_edges().unwrap().len(), 4);
        assert!(!mesh.is_closed().unwrap());
    }

    #[test]
    fn test_strict_policy_switch() {
        let mut mesh = TriMesh::from_parts(
            vec![Point::origin(); 5],
            vec![
                Face::new([0, 1, 2]),
                Face::new([1, 0, 3]),
                Face::new([0, 1, 4]),
            ],
            Dimensionality::Surface,
        )
        .unwrap();

        assert_eq!(mesh.non_manifold_edges().unwrap(), &[Edge(0, 1)]);

        mesh.set_manifold_policy(ManifoldPolicy::Strict);
        assert!(matches!(
            mesh.across_edge(),
            Err(MeshError::NonManifoldEdge(..))
        ));
        assert!(mesh.boundary_edges().is_err());
    }

    #[test]
    fn test_planar_normals_point_up() {
        let mut mesh = make_square();

        for n in mesh.normals() {
            assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
        }
        assert_eq!(mesh.face_normals().len(), 2);
        assert_eq!(mesh.normals_flat().len(), 12);
    }

    #[test]
    fn test_isolated_vertex_has_zero_normal_and_area() {
        let mut mesh = make_square();
        let mut vertices = mesh.vertices().to_vec();
        vertices.push(Point::new(5.0, 5.0, 0.0));
        mesh.set_vertices(vertices).unwrap();

        assert_eq!(mesh.normals()[4], Vec3::zeros());
        assert_eq!(mesh.point_areas()[4], 0.0);
    }

    #[test]
    fn test_point_areas_stored_as_field() {
        let mut mesh = make_square();
        let total: f64 = mesh.point_areas().iter().sum();

        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.total_area(), 1.0, epsilon = 1e-12);
        assert_eq!(mesh.field(AREA_FIELD).map(<[f64]>::len), Some(4));
    }

    #[test]
    fn test_small_scale_square_keeps_areas_and_normals() {
        let mut mesh = make_square();
        let scaled: Vec<Point> = mesh
            .vertices()
            .iter()
            .map(|p| Point::from(p.coords * 1e-7))
            .collect();
        mesh.set_vertices(scaled).unwrap();

        let total = mesh.total_area();
        let sum: f64 = mesh.point_areas().iter().sum();
        assert!(total > 0.0);
        assert_relative_eq!(sum, total, max_relative = 1e-9);
        for n in mesh.normals() {
            assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_field_length_checked() {
        let mut mesh = make_square();

        assert!(mesh.set_field("density", vec![1.0; 3]).is_err());
        mesh.set_field("density", vec![1.0; 4]).unwrap();
        assert_eq!(mesh.field("density"), Some(&[1.0; 4][..]));
        assert!(mesh.remove_field("density").is_some());
        assert!(mesh.field("density").is_none());
    }
}
