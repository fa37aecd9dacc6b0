//! Ghost-vertex duplication for faces crossing the periodic boundary
//!
//! A face crosses the boundary when one of its edges spans more than half
//! the box along x or y. Along such an axis, every vertex lying more than
//! half a box below the face's largest coordinate is replaced by a ghost
//! shifted by `+1` box length, so all ghosts sit past the upper box faces and
//! neighbouring crossing faces share the same ghosts. Faces are assumed to be
//! smaller than half the box.

use crate::error::{MeshError, Result};
use crate::mesh::types::{Face, Point};
use crate::periodic::bbox::PeriodicBox;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of axes that carry wrap offsets (x and y)
pub const WRAP_AXES: usize = 2;

/// Source of a ghost vertex: original index and periodic image offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicateOrigin {
    /// Index of the original (wrapped) vertex
    pub original: usize,

    /// Image offset in box lengths along x and y
    pub wrap: [i32; 2],
}

/// Result of splitting a wrapped mesh into interior and crossing faces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Duplication {
    /// Faces that do not cross the boundary
    pub interior_faces: Vec<Face>,

    /// Crossing faces, referencing the original vertices
    pub periodic_faces: Vec<Face>,

    /// Crossing faces rewritten to reference ghosts (indices follow the originals)
    pub trimmed_faces: Vec<Face>,

    /// Source of each ghost, in ghost order
    pub origins: Vec<DuplicateOrigin>,

    /// Ghost positions, in ghost order
    pub vertices: Vec<Point>,
}

impl Duplication {
    /// Number of ghost vertices
    pub fn num_duplicates(&self) -> usize {
        self.origins.len()
    }
}

/// Position of the periodic image described by `origin`
pub fn ghost_position(vertices: &[Point], origin: &DuplicateOrigin, bbox: &PeriodicBox) -> Result<Point> {
    let p = vertices
        .get(origin.original)
        .ok_or_else(|| MeshError::invalid_index(origin.original, vertices.len(), "duplication map"))?;

    let mut ghost = *p;
    for d in 0..WRAP_AXES {
        ghost[d] += f64::from(origin.wrap[d]) * bbox.extent(d);
    }
    Ok(ghost)
}

/// Wrap offsets of the three corners of a face, or `None` if it is interior
pub fn face_wrap_offsets(face: &Face, vertices: &[Point], bbox: &PeriodicBox) -> Option<[[i32; 2]; 3]> {
    let [a, b, c] = face.vertex_ids;
    let corners = [&vertices[a], &vertices[b], &vertices[c]];

    let mut offsets = [[0i32; 2]; 3];
    let mut crossing = false;

    for d in 0..WRAP_AXES {
        let coords = [corners[0][d], corners[1][d], corners[2][d]];
        let spans = (0..3).any(|k| bbox.crosses_half(d, coords[k] - coords[(k + 1) % 3]));
        if !spans {
            continue;
        }

        crossing = true;
        let hi = coords.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for (k, offset) in offsets.iter_mut().enumerate() {
            if bbox.crosses_half(d, hi - coords[k]) {
                offset[d] = 1;
            }
        }
    }

    crossing.then_some(offsets)
}

/// Split faces into interior and crossing faces and synthesize ghosts
///
/// `vertices` must already be wrapped into `bbox`.
pub fn create_duplicates(vertices: &[Point], faces: &[Face], bbox: &PeriodicBox) -> Result<Duplication> {
    let n = vertices.len();
    let mut duplication = Duplication::default();
    let mut lookup: HashMap<DuplicateOrigin, usize> = HashMap::new();

    for face in faces {
        let Some(offsets) = face_wrap_offsets(face, vertices, bbox) else {
            duplication.interior_faces.push(*face);
            continue;
        };

        let mut trimmed = face.vertex_ids;
        for (k, wrap) in offsets.iter().enumerate() {
            if *wrap == [0, 0] {
                continue;
            }

            let origin = DuplicateOrigin {
                original: face.vertex_ids[k],
                wrap: *wrap,
            };

            trimmed[k] = match lookup.get(&origin) {
                Some(&idx) => idx,
                None => {
                    let idx = n + duplication.origins.len();
                    duplication.vertices.push(ghost_position(vertices, &origin, bbox)?);
                    duplication.origins.push(origin);
                    lookup.insert(origin, idx);
                    idx
                }
            };
        }

        duplication.periodic_faces.push(*face);
        duplication.trimmed_faces.push(Face::new(trimmed));
    }

    Ok(duplication)
}

/// Recompute ghost positions from a duplication map
///
/// Every original index is checked before anything is produced.
pub fn regenerate_ghosts(
    vertices: &[Point],
    origins: &[DuplicateOrigin],
    bbox: &PeriodicBox,
) -> Result<Vec<Point>> {
    origins
        .iter()
        .map(|origin| ghost_position(vertices, origin, bbox))
        .collect()
}
