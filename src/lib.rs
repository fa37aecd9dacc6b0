//! Membrane Mesh Library
//!
//! Connectivity, per-vertex derived quantities, kernel density estimation and
//! periodic-box handling for triangulated membrane surfaces and planar meshes.

pub mod config;
pub mod density;
pub mod error;
pub mod io;
pub mod mesh;
pub mod periodic;

pub use density::{DensityKernel, KernelShape};
pub use error::{MeshError, Result};
pub use mesh::{Dimensionality, Face, ManifoldPolicy, MeshView, TriMesh};
pub use periodic::{DuplicateOrigin, PeriodicBox, PeriodicState, TriMeshPeriodic};
