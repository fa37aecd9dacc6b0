//! Periodic boundary handling for membrane patches
//!
//! A simulation membrane lives in a box that is periodic in x and y. The
//! pipeline is: set the box, wrap vertices into it, then create ghost
//! vertices so faces that cross the boundary can be drawn without spanning
//! the whole box.

pub mod bbox;
pub mod duplicate;
pub mod mesh;

pub use bbox::PeriodicBox;
pub use duplicate::{DuplicateOrigin, Duplication};
pub use mesh::{PeriodicState, TriMeshPeriodic};
