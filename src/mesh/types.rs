//! Core mesh data types and flat-buffer conversion

use crate::error::{MeshError, Result};
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// 3D point type
pub type Point = Point3<f64>;

/// 2D point type (parameter-space coordinates)
pub type Point2D = Point2<f64>;

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// Dimensionality of the mesh vertices
///
/// Planar meshes store their vertices as 3D points with `z = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimensionality {
    /// Planar mesh (x, y)
    Planar,
    /// Surface mesh embedded in 3D (x, y, z)
    Surface,
}

impl Dimensionality {
    /// Parse a component count (2 or 3)
    pub fn from_components(d: usize) -> Result<Self> {
        match d {
            2 => Ok(Dimensionality::Planar),
            3 => Ok(Dimensionality::Surface),
            _ => Err(MeshError::ConfigurationError(format!(
                "Mesh dimensionality must be 2 or 3, got {}",
                d
            ))),
        }
    }

    /// Number of coordinate components (2 or 3)
    pub fn components(self) -> usize {
        match self {
            Dimensionality::Planar => 2,
            Dimensionality::Surface => 3,
        }
    }
}

/// Triangle face with 3 vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Face {
    /// Vertex indices; the order fixes the orientation of the face normal
    pub vertex_ids: [usize; 3],
}

impl Face {
    /// Create a new face
    pub fn new(vertex_ids: [usize; 3]) -> Self {
        Self { vertex_ids }
    }

    /// Edge opposite local vertex `k`, oriented as stored in the face
    pub fn opposite_edge(&self, k: usize) -> Edge {
        let v = self.vertex_ids;
        Edge(v[(k + 1) % 3], v[(k + 2) % 3])
    }

    /// Local position (0..3) of a vertex in this face
    pub fn local_index(&self, vertex: usize) -> Option<usize> {
        self.vertex_ids.iter().position(|&v| v == vertex)
    }

    /// Check whether the face references the vertex
    pub fn contains(&self, vertex: usize) -> bool {
        self.vertex_ids.contains(&vertex)
    }

    /// Check the face against a vertex count: indices in bounds and distinct
    pub fn validate(&self, num_vertices: usize) -> Result<()> {
        for &v in &self.vertex_ids {
            if v >= num_vertices {
                return Err(MeshError::invalid_index(v, num_vertices, "face"));
            }
        }

        let [a, b, c] = self.vertex_ids;
        if a == b || b == c || a == c {
            return Err(MeshError::InvalidMeshTopology(format!(
                "Face {:?} repeats a vertex",
                self.vertex_ids
            )));
        }

        Ok(())
    }
}

/// Directed edge between two vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge(pub usize, pub usize);

impl Edge {
    /// Get canonical form for hashing (smaller vertex first)
    pub fn canonical(&self) -> Self {
        if self.0 <= self.1 {
            *self
        } else {
            Edge(self.1, self.0)
        }
    }

    /// Check whether both edges join the same pair of vertices
    pub fn same_vertices(&self, other: &Edge) -> bool {
        self.canonical() == other.canonical()
    }
}

/// Convert a flat coordinate buffer (`n * dim` values) into points
///
/// For `dim == 2` the third coordinate is set to 0.
pub fn points_from_flat(coords: &[f64], dim: Dimensionality) -> Result<Vec<Point>> {
    let d = dim.components();
    if coords.len() % d != 0 {
        return Err(MeshError::InvalidMeshTopology(format!(
            "Coordinate buffer of length {} is not a multiple of {}",
            coords.len(),
            d
        )));
    }

    let points = coords
        .chunks_exact(d)
        .map(|c| match dim {
            Dimensionality::Planar => Point::new(c[0], c[1], 0.0),
            Dimensionality::Surface => Point::new(c[0], c[1], c[2]),
        })
        .collect();

    Ok(points)
}

/// Flatten points into `[x0, y0, z0, x1, ...]`
pub fn points_to_flat(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
}

/// Flatten vectors into `[x0, y0, z0, x1, ...]`
pub fn vectors_to_flat(vectors: &[Vec3]) -> Vec<f64> {
    vectors.iter().flat_map(|v| [v.x, v.y, v.z]).collect()
}

/// Convert a flat index buffer (`n * 3` values) into faces
///
/// Only the shape is checked here; indices are validated against the vertex
/// count by the mesh when the faces are installed.
pub fn faces_from_flat(indices: &[usize]) -> Result<Vec<Face>> {
    if indices.len() % 3 != 0 {
        return Err(MeshError::InvalidMeshTopology(format!(
            "Face buffer of length {} is not a multiple of 3",
            indices.len()
        )));
    }

    Ok(indices
        .chunks_exact(3)
        .map(|c| Face::new([c[0], c[1], c[2]]))
        .collect())
}

/// Flatten faces into `[a0, b0, c0, a1, ...]`
pub fn faces_to_flat(faces: &[Face]) -> Vec<usize> {
    faces.iter().flat_map(|f| f.vertex_ids).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_edge() {
        let face = Face::new([4, 7, 9]);

        assert_eq!(face.opposite_edge(0), Edge(7, 9));
        assert_eq!(face.opposite_edge(1), Edge(9, 4));
        assert_eq!(face.opposite_edge(2), Edge(4, 7));
    }

    #[test]
    fn test_edge_canonical() {
        assert_eq!(Edge(5, 2).canonical(), Edge(2, 5));
        assert!(Edge(5, 2).same_vertices(&Edge(2, 5)));
        assert!(!Edge(5, 2).same_vertices(&Edge(2, 6)));
    }

    #[test]
    fn test_face_validate() {
        assert!(Face::new([0, 1, 2]).validate(3).is_ok());
        assert!(matches!(
            Face::new([0, 1, 3]).validate(3),
            Err(MeshError::InvalidIndex { index: 3, .. })
        ));
        assert!(matches!(
            Face::new([0, 1, 1]).validate(3),
            Err(MeshError::InvalidMeshTopology(_))
        ));
    }

    #[test]
    fn test_planar_points_from_flat() {
        let points = points_from_flat(&[1.0, 2.0, 3.0, 4.0], Dimensionality::Planar).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[1], Point::new(3.0, 4.0, 0.0));
        assert_eq!(points_to_flat(&points), vec![1.0, 2.0, 0.0, 3.0, 4.0, 0.0]);
    }

    #[test]
    fn test_flat_buffer_length_mismatch() {
        assert!(points_from_flat(&[1.0, 2.0, 3.0, 4.0], Dimensionality::Surface).is_err());
        assert!(faces_from_flat(&[0, 1]).is_err());
        assert!(Dimensionality::from_components(4).is_err());
    }
}
