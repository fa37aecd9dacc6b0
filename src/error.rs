//! Error types for membrane mesh analysis
//!
//! This module defines all error types that can occur while building meshes,
//! computing connectivity and derived fields, handling periodic boxes, and
//! reading or writing mesh files.

use thiserror::Error;

/// Error types for mesh operations
///
/// Structural problems (bad indices, missing bounding box) are reported
/// through this enum and leave the mesh untouched. Numerical edge cases such
/// as degenerate triangles are not errors for mesh-wide computations; they
/// degrade to zero-valued contributions instead.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Invalid or missing configuration
    ///
    /// Unset or inverted bounding box, mismatched dimensionality, calling a
    /// periodic operation in the wrong state, or an invalid kernel.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An index is out of range
    ///
    /// Raised for face indices, query ids, and duplication map entries that
    /// do not reference an existing vertex.
    #[error("Invalid index {index} in {context} (valid range 0..{len})")]
    InvalidIndex {
        index: usize,
        len: usize,
        context: String,
    },

    /// Mesh topology is invalid
    ///
    /// Faces with repeated vertices, flat buffers whose length is not a
    /// multiple of the stride, or fields of the wrong length.
    #[error("Invalid mesh topology: {0}")]
    InvalidMeshTopology(String),

    /// Geometric computation error
    ///
    /// Only returned by the standalone geometry helpers. Mesh-wide normal and
    /// area computations treat degenerate faces as zero contributions.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// More than two faces share an edge
    ///
    /// Only returned when the strict manifold policy is selected.
    #[error("Non-manifold edge ({0}, {1}) shared by {2} faces")]
    NonManifoldEdge(usize, usize, usize),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed mesh file
    #[error("Parse error: {0}")]
    ParseError(String),

    /// VTK file writing error
    #[error("VTK error: {0}")]
    VtkError(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl MeshError {
    /// Shorthand for an [`MeshError::InvalidIndex`] error
    pub fn invalid_index(index: usize, len: usize, context: impl Into<String>) -> Self {
        MeshError::InvalidIndex {
            index,
            len,
            context: context.into(),
        }
    }
}

/// Convenience type alias for Results with [`MeshError`]
///
/// # Example
/// ```
/// use membrane_mesh::Result;
///
/// fn my_function() -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, MeshError>;
