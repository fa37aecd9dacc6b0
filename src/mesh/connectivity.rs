//! Connectivity construction from raw vertex/face arrays
//!
//! All builders are single passes over the face list. The results are plain
//! values; memoization lives in [`TriMesh`](crate::mesh::TriMesh).

use crate::error::{MeshError, Result};
use crate::mesh::adjacency::Adjacency;
use crate::mesh::types::{Edge, Face};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What to do when more than two faces share an edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifoldPolicy {
    /// Link the first matching face in adjacent-face order and keep going
    #[default]
    FirstMatch,
    /// Fail the across-edge build with [`MeshError::NonManifoldEdge`]
    Strict,
}

/// Per-face across-edge links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcrossEdge {
    /// `links[f][k]` is the face across the edge opposite vertex `k` of `f`
    pub links: Vec<[Option<usize>; 3]>,

    /// Edges shared by more than two faces (canonical form, sorted)
    pub non_manifold: Vec<Edge>,
}

impl AcrossEdge {
    /// Number of faces
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links of face `f`
    pub fn get(&self, f: usize) -> Option<&[Option<usize>; 3]> {
        self.links.get(f)
    }
}

/// For each vertex, the vertices sharing at least one face with it
///
/// Lists are in first-seen order of a single pass over the faces and never
/// contain the vertex itself.
pub fn build_neighbors(num_vertices: usize, faces: &[Face]) -> Adjacency {
    let mut lists: Vec<Vec<usize>> = vec![Vec::new(); num_vertices];

    for face in faces {
        let v = face.vertex_ids;
        for k in 0..3 {
            let a = v[k];
            let b = v[(k + 1) % 3];

            // Per-vertex degree is small, a linear scan beats hashing here
            if !lists[a].contains(&b) {
                lists[a].push(b);
            }
            if !lists[b].contains(&a) {
                lists[b].push(a);
            }
        }
    }

    let adjacency = Adjacency::from_lists(lists);
    log::debug!(
        "Built neighbor lists: {} vertices, {} entries",
        adjacency.len(),
        adjacency.total_entries()
    );
    adjacency
}

/// For each vertex, the faces containing it, in face order
pub fn build_adjacent_faces(num_vertices: usize, faces: &[Face]) -> Adjacency {
    let mut lists: Vec<Vec<usize>> = vec![Vec::new(); num_vertices];

    for (face_idx, face) in faces.iter().enumerate() {
        for &v in &face.vertex_ids {
            lists[v].push(face_idx);
        }
    }

    Adjacency::from_lists(lists)
}

/// Link every face edge to the other face sharing the same vertex pair
///
/// Candidate faces are taken from the adjacent-face list of the edge's first
/// endpoint. With [`ManifoldPolicy::FirstMatch`], an edge shared by more than
/// two faces links the first candidate found and is recorded in
/// [`AcrossEdge::non_manifold`].
pub fn build_across_edge(
    faces: &[Face],
    adjacent_faces: &Adjacency,
    policy: ManifoldPolicy,
) -> Result<AcrossEdge> {
    let mut links = Vec::with_capacity(faces.len());
    let mut non_manifold: HashSet<Edge> = HashSet::new();

    for (face_idx, face) in faces.iter().enumerate() {
        let mut face_links = [None; 3];

        for (k, link) in face_links.iter_mut().enumerate() {
            let Edge(v1, v2) = face.opposite_edge(k);

            let mut matches = adjacent_faces
                .get(v1)
                .iter()
                .copied()
                .filter(|&other| other != face_idx && faces[other].contains(v2));

            *link = matches.next();

            let extra = matches.count();
            if link.is_some() && extra > 0 {
                if policy == ManifoldPolicy::Strict {
                    return Err(MeshError::NonManifoldEdge(v1, v2, extra + 2));
                }
                non_manifold.insert(Edge(v1, v2).canonical());
            }
        }

        links.push(face_links);
    }

    let mut non_manifold: Vec<Edge> = non_manifold.into_iter().collect();
    non_manifold.sort_by_key(|e| (e.0, e.1));

    if !non_manifold.is_empty() {
        log::warn!(
            "Mesh has {} non-manifold edges; linked the first adjacent face for each",
            non_manifold.len()
        );
    }

    Ok(AcrossEdge {
        links,
        non_manifold,
    })
}

/// Edges without an across-edge face, oriented as stored in their face
pub fn build_boundary_edges(faces: &[Face], across: &AcrossEdge) -> Vec<Edge> {
    let mut edges = Vec::new();

    for (face, links) in faces.iter().zip(across.links.iter()) {
        for (k, link) in links.iter().enumerate() {
            if link.is_none() {
                edges.push(face.opposite_edge(k));
            }
        }
    }

    log::debug!("Found {} boundary edges", edges.len());
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_faces() -> Vec<Face> {
        // Unit square split along the 0-2 diagonal
        vec![Face::new([0, 1, 2]), Face::new([0, 2, 3])]
    }

    #[test]
    fn test_neighbors_of_square() {
        let adj = build_neighbors(4, &square_faces());

        assert_eq!(adj.get(0), &[1, 2, 3]);
        assert_eq!(adj.get(1), &[0, 2]);
        assert_eq!(adj.get(2), &[1, 0, 3]);
        assert_eq!(adj.get(3), &[2, 0]);
    }

    #[test]
    fn test_adjacent_faces_order() {
        let adj = build_adjacent_faces(4, &square_faces());

        assert_eq!(adj.get(0), &[0, 1]);
        assert_eq!(adj.get(1), &[0]);
        assert_eq!(adj.get(2), &[0, 1]);
        assert_eq!(adj.get(3), &[1]);
    }

    #[test]
    fn test_across_edge_shared_diagonal() {
        let faces = square_faces();
        let adj = build_adjacent_faces(4, &faces);
        let across = build_across_edge(&faces, &adj, ManifoldPolicy::FirstMatch).unwrap();

        // Face 0 = (0,1,2): diagonal 2-0 is opposite vertex 1
        assert_eq!(across.links[0], [None, Some(1), None]);
        // Face 1 = (0,2,3): diagonal 0-2 is opposite vertex 2
        assert_eq!(across.links[1], [None, None, Some(0)]);
        assert!(across.non_manifold.is_empty());

        let boundary = build_boundary_edges(&faces, &across);
        assert_eq!(
            boundary,
            vec![Edge(1, 2), Edge(0, 1), Edge(2, 3), Edge(3, 0)]
        );
    }

    fn fan_faces() -> Vec<Face> {
        // Three faces hinged on edge 0-1
        vec![
            Face::new([0, 1, 2]),
            Face::new([1, 0, 3]),
            Face::new([0, 1, 4]),
        ]
    }

    #[test]
    fn test_non_manifold_first_match() {
        let faces = fan_faces();
        let adj = build_adjacent_faces(5, &faces);
        let across = build_across_edge(&faces, &adj, ManifoldPolicy::FirstMatch).unwrap();

        // Edge 0-1 is opposite vertex 2 in face 0
        assert_eq!(across.links[0][2], Some(1));
        assert_eq!(across.links[1][2], Some(0));
        assert_eq!(across.links[2][2], Some(0));
        assert_eq!(across.non_manifold, vec![Edge(0, 1)]);
    }

    #[test]
    fn test_non_manifold_strict() {
        let faces = fan_faces();
        let adj = build_adjacent_faces(5, &faces);
        let result = build_across_edge(&faces, &adj, ManifoldPolicy::Strict);

        assert!(matches!(result, Err(MeshError::NonManifoldEdge(_, _, 3))));
    }
}
