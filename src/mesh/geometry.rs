//! Geometric operations for triangle faces

use crate::error::{MeshError, Result};
use crate::mesh::types::{Face, Point, Point2D, Vec3};
use std::f64::consts::FRAC_PI_2;

/// Largest `sin` of a corner angle that still counts as degenerate
///
/// The test is relative to the edge lengths, so it holds at any mesh scale.
pub const DEGENERATE_TOL: f64 = 4.0 * f64::EPSILON;

/// Check whether the corner spanned by edges `u` and `v` has zero area
pub fn is_degenerate_corner(u: &Vec3, v: &Vec3) -> bool {
    let scale = u.norm() * v.norm();
    scale == 0.0 || u.cross(v).norm() <= DEGENERATE_TOL * scale
}

/// Unnormalized face normal `(b - a) x (c - a)`
///
/// The edge order follows the face vertex order, so counter-clockwise faces
/// seen from `+z` get a `+z` normal.
pub fn face_cross(a: &Point, b: &Point, c: &Point) -> Vec3 {
    (b - a).cross(&(c - a))
}

/// Unit face normal, or `None` for a zero-area triangle
pub fn face_normal(a: &Point, b: &Point, c: &Point) -> Option<Vec3> {
    let ab = b - a;
    let ac = c - a;
    if is_degenerate_corner(&ab, &ac) {
        None
    } else {
        Some(ab.cross(&ac).normalize())
    }
}

/// Compute the unit normal of a face from the vertex array
///
/// Unlike [`face_normal`], degenerate faces are reported as an error.
pub fn compute_face_normal(face: &Face, points: &[Point]) -> Result<Vec3> {
    let [a, b, c] = face_points(face, points)?;
    face_normal(a, b, c).ok_or_else(|| {
        MeshError::DegenerateGeometry(format!("Face {:?} has zero area", face.vertex_ids))
    })
}

/// Area of the triangle (a, b, c)
pub fn triangle_area(a: &Point, b: &Point, c: &Point) -> f64 {
    0.5 * face_cross(a, b, c).norm()
}

/// Angle in radians at vertex `a` of triangle (a, b, c)
pub fn corner_angle(a: &Point, b: &Point, c: &Point) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let norm_product = ab.norm() * ac.norm();
    if norm_product == 0.0 {
        return 0.0;
    }
    (ab.dot(&ac) / norm_product).clamp(-1.0, 1.0).acos()
}

/// Cotangent of the angle at vertex `a` of triangle (a, b, c)
pub fn cotangent(a: &Point, b: &Point, c: &Point) -> f64 {
    let ab = b - a;
    let ac = c - a;
    if is_degenerate_corner(&ab, &ac) {
        0.0
    } else {
        ab.dot(&ac) / ab.cross(&ac).norm()
    }
}

/// Local index (0, 1, 2) of the obtuse corner of a triangle, if any
pub fn obtuse_corner(p0: &Point, p1: &Point, p2: &Point) -> Option<usize> {
    let angles = [
        corner_angle(p0, p1, p2),
        corner_angle(p1, p2, p0),
        corner_angle(p2, p0, p1),
    ];
    angles.iter().position(|&angle| angle > FRAC_PI_2)
}

/// Compute the distance between two points
pub fn distance(p1: &Point, p2: &Point) -> f64 {
    (p2 - p1).norm()
}

/// Barycentric coordinates of `p` with respect to triangle (a, b, c)
///
/// `p` is implicitly projected onto the triangle's plane. Returns
/// `DegenerateGeometry` for a zero-area triangle.
pub fn point_to_barycentric(p: &Point, a: &Point, b: &Point, c: &Point) -> Result<Vec3> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);

    if is_degenerate_corner(&v0, &v1) {
        return Err(MeshError::DegenerateGeometry(
            "Barycentric coordinates of a zero-area triangle".to_string(),
        ));
    }

    let denom = d00 * d11 - d01 * d01;
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Ok(Vec3::new(1.0 - v - w, v, w))
}

/// Point in a 2D triangle (a, b, c) from barycentric coordinates
pub fn barycentric_to_point(bary: &Vec3, a: &Point2D, b: &Point2D, c: &Point2D) -> Point2D {
    Point2D::from(a.coords * bary.x + b.coords * bary.y + c.coords * bary.z)
}

/// Look up the three corner points of a face
pub fn face_points<'a>(face: &Face, points: &'a [Point]) -> Result<[&'a Point; 3]> {
    let [a, b, c] = face.vertex_ids;
    Ok([
        get_point(points, a)?,
        get_point(points, b)?,
        get_point(points, c)?,
    ])
}

/// Helper to safely get a point from the vertex array
fn get_point(points: &[Point], index: usize) -> Result<&Point> {
    points
        .get(index)
        .ok_or_else(|| MeshError::invalid_index(index, points.len(), "vertex array"))
}
