//! Per-face and per-vertex derived quantities: normals and mixed Voronoi areas

use crate::mesh::adjacency::Adjacency;
use crate::mesh::geometry::{
    cotangent, face_normal, is_degenerate_corner, obtuse_corner, triangle_area, DEGENERATE_TOL,
};
use crate::mesh::types::{Face, Point, Vec3};

/// Face and vertex normals of a mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normals {
    /// One unit normal per face; zero for degenerate faces
    pub face: Vec<Vec3>,

    /// One unit normal per vertex; zero for isolated vertices
    pub vertex: Vec<Vec3>,
}

/// Compute face normals followed by unweighted vertex normals
pub fn compute_normals(vertices: &[Point], faces: &[Face], adjacent_faces: &Adjacency) -> Normals {
    let mut degenerate = 0usize;

    let face: Vec<Vec3> = faces
        .iter()
        .map(|f| {
            let [a, b, c] = f.vertex_ids;
            face_normal(&vertices[a], &vertices[b], &vertices[c]).unwrap_or_else(|| {
                degenerate += 1;
                Vec3::zeros()
            })
        })
        .collect();

    if degenerate > 0 {
        log::debug!("{} degenerate faces contribute zero normals", degenerate);
    }

    let vertex = adjacent_faces
        .iter()
        .map(|adjacent| {
            let sum: Vec3 = adjacent.iter().map(|&f| face[f]).sum();
            let norm = sum.norm();
            // Face normals are unit length, so the sum needs no scaling
            if norm <= DEGENERATE_TOL {
                Vec3::zeros()
            } else {
                sum / norm
            }
        })
        .collect();

    Normals { face, vertex }
}

/// Split a triangle's area among its three corners
///
/// Non-obtuse triangles use the Voronoi (circumcenter) split; a triangle with
/// an obtuse corner gives that corner half its area and the other two a
/// quarter each. The three values always sum to the triangle area.
pub fn mixed_corner_areas(p: [&Point; 3]) -> [f64; 3] {
    if is_degenerate_corner(&(p[1] - p[0]), &(p[2] - p[0])) {
        return [0.0; 3];
    }
    let area = triangle_area(p[0], p[1], p[2]);

    if let Some(obtuse) = obtuse_corner(p[0], p[1], p[2]) {
        let mut corners = [0.25 * area; 3];
        corners[obtuse] = 0.5 * area;
        return corners;
    }

    let mut corners = [0.0; 3];
    for (i, corner) in corners.iter_mut().enumerate() {
        let pi = p[i];
        let pj = p[(i + 1) % 3];
        let pk = p[(i + 2) % 3];

        // Edge i-j is weighted by the cotangent of the angle opposite it (at k)
        let cot_k = cotangent(pk, pi, pj);
        let cot_j = cotangent(pj, pk, pi);
        *corner = 0.125 * ((pj - pi).norm_squared() * cot_k + (pk - pi).norm_squared() * cot_j);
    }
    corners
}

/// Mixed Voronoi area of every vertex
pub fn compute_point_areas(vertices: &[Point], faces: &[Face], adjacent_faces: &Adjacency) -> Vec<f64> {
    let corner_areas: Vec<[f64; 3]> = faces
        .iter()
        .map(|f| {
            let [a, b, c] = f.vertex_ids;
            mixed_corner_areas([&vertices[a], &vertices[b], &vertices[c]])
        })
        .collect();

    adjacent_faces
        .iter()
        .enumerate()
        .map(|(v, adjacent)| {
            adjacent
                .iter()
                .filter_map(|&f| faces[f].local_index(v).map(|k| corner_areas[f][k]))
                .sum()
        })
        .collect()
}

/// Total surface area of the mesh
pub fn compute_total_area(vertices: &[Point], faces: &[Face]) -> f64 {
    faces
        .iter()
        .map(|f| {
            let [a, b, c] = f.vertex_ids;
            triangle_area(&vertices[a], &vertices[b], &vertices[c])
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_equilateral_corners_are_equal() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(1.0, 0.0, 0.0);
        let c = Point::new(0.5, 3f64.sqrt() / 2.0, 0.0);

        let corners = mixed_corner_areas([&a, &b, &c]);
        let area = triangle_area(&a, &b, &c);

        for corner in corners {
            assert_relative_eq!(corner, area / 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_obtuse_split() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(2.0, 0.0, 0.0);
        let c = Point::new(1.0, 0.2, 0.0);

        let corners = mixed_corner_areas([&a, &b, &c]);
        let area = triangle_area(&a, &b, &c);

        assert_relative_eq!(corners[2], area / 2.0, epsilon = 1e-12);
        assert_relative_eq!(corners[0], area / 4.0, epsilon = 1e-12);
        assert_relative_eq!(corners[1], area / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_right_triangle_corner_sum() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(3.0, 0.0, 0.0);
        let c = Point::new(0.0, 4.0, 0.0);

        let corners = mixed_corner_areas([&a, &b, &c]);
        assert_relative_eq!(corners.iter().sum::<f64>(), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_corners_are_zero() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(1.0, 0.0, 0.0);
        let c = Point::new(2.0, 0.0, 0.0);

        assert_eq!(mixed_corner_areas([&a, &b, &c]), [0.0; 3]);
    }

    #[test]
    fn test_small_scale_corners_sum_to_area() {
        let scale = 1e-7;
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(3.0 * scale, 0.0, 0.0);
        let c = Point::new(0.0, 4.0 * scale, 0.0);

        let corners = mixed_corner_areas([&a, &b, &c]);
        let area = triangle_area(&a, &b, &c);
        assert!(area > 0.0);
        assert_relative_eq!(corners.iter().sum::<f64>(), area, max_relative = 1e-9);
    }
}
