//! I/O module for reading and writing mesh files

pub mod binary;
pub mod json;
pub mod off;
pub mod summary;
pub mod vtp;

pub use binary::{read_binary, write_binary};
pub use json::{read_json_mesh, write_json_mesh};
pub use off::{read_off, write_off};
pub use summary::AnalysisSummary;
pub use vtp::{write_mesh_with_normals, write_periodic_vtp, write_vtp};

use crate::error::{MeshError, Result};
use crate::mesh::TriMesh;
use std::path::Path;

/// Upper bound on capacity reserved from counts read out of a file header
///
/// Larger inputs still load; their buffers grow as elements are read.
pub(crate) const MAX_PREALLOC: usize = 1 << 20;

/// Read a mesh, choosing the format from the file extension
///
/// `.off`, `.json` and `.tmsh` are recognized.
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "off" => read_off(path, None),
        "json" => read_json_mesh(path),
        "tmsh" => read_binary(path),
        other => Err(MeshError::ConfigurationError(format!(
            "Unsupported mesh format '{}' for {:?}",
            other, path
        ))),
    }
}
