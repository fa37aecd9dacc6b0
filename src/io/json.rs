//! JSON mesh format with named per-vertex fields

use crate::error::{MeshError, Result};
use crate::mesh::types::{Dimensionality, Face, Point};
use crate::mesh::{MeshView, TriMesh};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct JsonMesh {
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_dimensionality")]
    dimensionality: Dimensionality,
    vertices: Vec<[f64; 3]>,
    faces: Vec<[usize; 3]>,
    #[serde(default)]
    fields: HashMap<String, Vec<f64>>,
}

fn default_dimensionality() -> Dimensionality {
    Dimensionality::Surface
}

pub fn read_json_mesh<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let file = File::open(path.as_ref())?;

    let reader = BufReader::new(file);
    let json_mesh: JsonMesh = serde_json::from_reader(reader).map_err(|e| {
        MeshError::SerializationError(format!("Failed to parse JSON mesh: {}", e))
    })?;

    let vertices = json_mesh
        .vertices
        .into_iter()
        .map(|[x, y, z]| Point::new(x, y, z))
        .collect();

    let faces = json_mesh.faces.into_iter().map(Face::new).collect();

    let mut mesh = TriMesh::from_parts(vertices, faces, json_mesh.dimensionality)?;
    if let Some(name) = json_mesh.name {
        mesh.set_name(name);
    }
    for (name, values) in json_mesh.fields {
        mesh.set_field(name, values)?;
    }

    Ok(mesh)
}

pub fn write_json_mesh<M: MeshView, P: AsRef<Path>>(mesh: &M, path: P) -> Result<()> {
    let json_mesh = JsonMesh {
        name: Some(mesh.name().to_string()),
        dimensionality: mesh.dimensionality(),
        vertices: mesh.vertices().iter().map(|p| [p.x, p.y, p.z]).collect(),
        faces: mesh.faces().iter().map(|f| f.vertex_ids).collect(),
        fields: mesh.fields().clone(),
    };

    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &json_mesh).map_err(|e| {
        MeshError::SerializationError(format!("Failed to write JSON mesh: {}", e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_json_roundtrip() {
        let mut mesh = TriMesh::from_parts(
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(1.0, 1.0, 0.0),
                Point::new(0.0, 1.0, 0.5),
            ],
            vec![Face::new([0, 1, 2]), Face::new([0, 2, 3])],
            Dimensionality::Surface,
        )
        .unwrap();
        mesh.set_name("patch");
        mesh.set_field("curvature", vec![0.0, 0.1, 0.2, 0.3]).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("mesh.json");
        write_json_mesh(&mesh, &path).unwrap();
        let loaded = read_json_mesh(&path).unwrap();

        assert_eq!(loaded.name(), "patch");
        assert_eq!(loaded.nvertices(), 4);
        assert_eq!(loaded.nfaces(), 2);
        assert_eq!(loaded.field("curvature").map(|f| f.len()), Some(4));
    }

    #[test]
    fn test_minimal_json_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mesh.json");
        std::fs::write(
            &path,
            r#"{"vertices": [[0,0,0],[1,0,0],[0,1,0]], "faces": [[0,1,2]]}"#,
        )
        .unwrap();

        let loaded = read_json_mesh(&path).unwrap();
        assert_eq!(loaded.dimensionality(), Dimensionality::Surface);
        assert!(loaded.fields().is_empty());
    }

    #[test]
    fn test_bad_field_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mesh.json");
        std::fs::write(
            &path,
            r#"{"vertices": [[0,0,0],[1,0,0],[0,1,0]], "faces": [[0,1,2]], "fields": {"x": [1.0]}}"#,
        )
        .unwrap();

        assert!(matches!(
            read_json_mesh(&path),
            Err(MeshError::InvalidMeshTopology(_))
        ));
    }
}
