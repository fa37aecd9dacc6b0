//! VTP (VTK PolyData) file writer

use crate::error::{MeshError, Result};
use crate::mesh::types::{vectors_to_flat, Vec3};
use crate::mesh::{MeshView, TriMesh};
use crate::periodic::TriMeshPeriodic;
use std::path::Path;
use vtkio::model::*;

/// Default VTK file format version (2.2 for broad compatibility)
/// This version is compatible with ParaView and most VTK-based tools
pub const DEFAULT_VTK_VERSION: (u8, u8) = (2, 2);

/// Write a mesh to a VTP file
///
/// Every named field becomes a point-data scalar array. Vertex and face
/// normals, when given, are written as point and cell vectors named
/// `normals`.
pub fn write_vtp<M: MeshView>(
    mesh: &M,
    vertex_normals: Option<&[Vec3]>,
    face_normals: Option<&[Vec3]>,
    output_path: &Path,
    vtk_version: Option<(u8, u8)>,
) -> Result<()> {
    let version = vtk_version.unwrap_or(DEFAULT_VTK_VERSION);
    log::info!(
        "Writing mesh '{}' with {} faces to {:?} (VTK version {}.{})",
        mesh.name(),
        mesh.nfaces(),
        output_path,
        version.0,
        version.1
    );

    // Triangle connectivity
    let connectivity: Vec<u64> = mesh
        .faces()
        .iter()
        .flat_map(|f| f.vertex_ids.map(|id| id as u64))
        .collect();
    let offsets: Vec<u64> = (0..mesh.nfaces()).map(|i| ((i + 1) * 3) as u64).collect();

    let mut piece = PolyDataPiece {
        points: IOBuffer::F64(mesh.vertices_flat()),
        verts: None,
        lines: None,
        polys: Some(VertexNumbers::XML {
            connectivity,
            offsets,
        }),
        strips: None,
        data: Attributes::new(),
    };

    // Fields in name order so output is reproducible
    let mut names: Vec<&String> = mesh.fields().keys().collect();
    names.sort();
    for name in names {
        if let Some(values) = mesh.field(name) {
            piece.data.point.push(Attribute::DataArray(DataArray {
                name: name.clone(),
                elem: ElementType::Scalars {
                    num_comp: 1,
                    lookup_table: None,
                },
                data: IOBuffer::F64(values.to_vec()),
            }));
        }
    }

    if let Some(normals) = vertex_normals {
        check_length("vertex normals", normals.len(), mesh.nvertices())?;
        piece.data.point.push(Attribute::DataArray(DataArray {
            name: "normals".into(),
            elem: ElementType::Vectors,
            data: IOBuffer::F64(vectors_to_flat(normals)),
        }));
    }

    if let Some(normals) = face_normals {
        check_length("face normals", normals.len(), mesh.nfaces())?;
        piece.data.cell.push(Attribute::DataArray(DataArray {
            name: "normals".into(),
            elem: ElementType::Vectors,
            data: IOBuffer::F64(vectors_to_flat(normals)),
        }));
    }

    let vtk = Vtk {
        version: Version::new(version),
        title: format!("Triangle mesh: {}", mesh.name()),
        byte_order: ByteOrder::LittleEndian,
        data: DataSet::PolyData {
            meta: None,
            pieces: vec![Piece::Inline(Box::new(piece))],
        },
        file_path: None,
    };

    vtk.export(output_path)
        .map_err(|e| MeshError::VtkError(format!("Failed to write VTP file: {}", e)))?;

    log::info!("Successfully wrote VTP file to {:?}", output_path);

    Ok(())
}

/// Write a mesh together with its vertex and face normals
pub fn write_mesh_with_normals(
    mesh: &mut TriMesh,
    output_path: &Path,
    vtk_version: Option<(u8, u8)>,
) -> Result<()> {
    let vertex_normals = mesh.normals().to_vec();
    let face_normals = mesh.face_normals().to_vec();
    write_vtp(
        mesh,
        Some(&vertex_normals),
        Some(&face_normals),
        output_path,
        vtk_version,
    )
}

/// Write the trimmed patch of a duplicated periodic mesh
///
/// Original and ghost vertices are written together with interior and
/// trimmed faces, so no triangle spans the box.
pub fn write_periodic_vtp(
    mesh: &TriMeshPeriodic,
    output_path: &Path,
    vtk_version: Option<(u8, u8)>,
) -> Result<()> {
    let mut patch = mesh.trimmed_patch()?;
    write_mesh_with_normals(&mut patch, output_path, vtk_version)
}

fn check_length(what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(MeshError::InvalidMeshTopology(format!(
            "{} has {} entries, expected {}",
            what, got, expected
        )));
    }
    Ok(())
}
