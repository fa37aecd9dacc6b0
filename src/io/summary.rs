//! JSON summary export for mesh analysis results

use crate::error::{MeshError, Result};
use crate::mesh::{MeshView, TriMesh};
use crate::periodic::TriMeshPeriodic;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete summary of one analysis run
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Source mesh file
    pub mesh_file: String,

    /// Timestamp when the analysis was performed
    pub timestamp: String,

    /// Topology and area of the mesh
    pub mesh: MeshStatistics,

    /// One entry per named per-vertex field
    pub fields: Vec<FieldStatistics>,

    /// Present when the mesh was processed as a periodic patch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodic: Option<PeriodicStatistics>,
}

/// Counts and area of a mesh
#[derive(Debug, Serialize, Deserialize)]
pub struct MeshStatistics {
    pub name: String,
    pub num_vertices: usize,
    pub num_faces: usize,
    pub num_boundary_edges: usize,
    pub num_non_manifold_edges: usize,
    pub closed: bool,
    pub total_area: f64,
    pub avg_normal: [f64; 3],
}

/// Value range of a per-vertex field
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldStatistics {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Outcome of wrapping and duplication
#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodicStatistics {
    pub bbox_min: [f64; 3],
    pub bbox_max: [f64; 3],
    pub num_interior_faces: usize,
    pub num_periodic_faces: usize,
    pub num_duplicates: usize,
}

impl AnalysisSummary {
    /// Summarize a mesh, computing whatever connectivity is still missing
    pub fn new(mesh_file: String, mesh: &mut TriMesh) -> Result<Self> {
        let timestamp = chrono::Utc::now().to_rfc3339();

        let num_boundary_edges = mesh.boundary_edges()?.len();
        let num_non_manifold_edges = mesh.non_manifold_edges()?.len();
        let closed = mesh.is_closed()?;
        let avg_normal = compute_average_normal(mesh.face_normals());

        let statistics = MeshStatistics {
            name: mesh.name().to_string(),
            num_vertices: mesh.nvertices(),
            num_faces: mesh.nfaces(),
            num_boundary_edges,
            num_non_manifold_edges,
            closed,
            total_area: mesh.total_area(),
            avg_normal,
        };

        let mut fields: Vec<FieldStatistics> = mesh
            .fields()
            .iter()
            .map(|(name, values)| field_statistics(name, values))
            .collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self {
            mesh_file,
            timestamp,
            mesh: statistics,
            fields,
            periodic: None,
        })
    }

    /// Record the periodic processing of a mesh
    pub fn with_periodic(mut self, mesh: &TriMeshPeriodic) -> Result<Self> {
        let duplication = mesh.duplication()?;
        let bbox = mesh.bbox().ok_or_else(|| {
            MeshError::ConfigurationError("Periodic summary requires a bounding box".into())
        })?;

        self.periodic = Some(PeriodicStatistics {
            bbox_min: bbox.min,
            bbox_max: bbox.max,
            num_interior_faces: duplication.interior_faces.len(),
            num_periodic_faces: duplication.periodic_faces.len(),
            num_duplicates: duplication.num_duplicates(),
        });
        Ok(self)
    }

    /// Export summary to JSON file
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self).map_err(|e| {
            MeshError::SerializationError(format!("Failed to write JSON summary: {}", e))
        })?;
        Ok(())
    }
}

fn field_statistics(name: &str, values: &[f64]) -> FieldStatistics {
    if values.is_empty() {
        return FieldStatistics {
            name: name.to_string(),
            min: 0.0,
            max: 0.0,
            mean: 0.0,
        };
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    FieldStatistics {
        name: name.to_string(),
        min,
        max,
        mean,
    }
}

/// Average of the face normals, normalized; zero when they cancel
fn compute_average_normal(normals: &[crate::mesh::Vec3]) -> [f64; 3] {
    if normals.is_empty() {
        return [0.0, 0.0, 0.0];
    }

    let sum: crate::mesh::Vec3 = normals.iter().sum();
    let magnitude = sum.norm();

    if magnitude > 1e-10 {
        let n = sum / magnitude;
        [n.x, n.y, n.z]
    } else {
        [0.0, 0.0, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::types::{Dimensionality, Face, Point};
    use approx::assert_relative_eq;

    #[test]
    fn test_field_statistics() {
        let stats = field_statistics("phi", &[1.0, 3.0, 2.0]);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_relative_eq!(stats.mean, 2.0);
    }

    #[test]
    fn test_summary_of_square() {
        let mut mesh = TriMesh::from_parts(
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(1.0, 1.0, 0.0),
                Point::new(0.0, 1.0, 0.0),
            ],
            vec![Face::new([0, 1, 2]), Face::new([0, 2, 3])],
            Dimensionality::Planar,
        )
        .unwrap();
        mesh.point_areas();

        let summary = AnalysisSummary::new("square.off".into(), &mut mesh).unwrap();

        assert_eq!(summary.mesh.num_boundary_edges, 4);
        assert!(!summary.mesh.closed);
        assert_relative_eq!(summary.mesh.total_area, 1.0, epsilon = 1e-12);
        assert_eq!(summary.mesh.avg_normal, [0.0, 0.0, 1.0]);
        assert_eq!(summary.fields.len(), 1);
        assert_eq!(summary.fields[0].name, "area");
        assert!(summary.periodic.is_none());
    }

    #[test]
    fn test_closed_flag_matches_mesh() {
        let mut empty =
            TriMesh::from_parts(Vec::new(), Vec::new(), Dimensionality::Surface).unwrap();
        let summary = AnalysisSummary::new("empty.off".into(), &mut empty).unwrap();

        assert_eq!(summary.mesh.num_faces, 0);
        // No faces means no boundary edges
        assert!(summary.mesh.closed);
        assert_eq!(summary.mesh.closed, empty.is_closed().unwrap());
    }
}
