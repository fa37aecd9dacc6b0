//! Mesh data structures and operations

pub mod adjacency;
pub mod connectivity;
pub mod derived;
pub mod geometry;
pub mod trimesh;
pub mod types;

pub use adjacency::Adjacency;
pub use connectivity::{AcrossEdge, ManifoldPolicy};
pub use derived::Normals;
pub use geometry::*;
pub use trimesh::{MeshView, TriMesh, AREA_FIELD};
pub use types::*;
