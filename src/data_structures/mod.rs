//! Engine data structures: shapes, instances and the combined mesh.
//!
//! - `shape` holds reusable shape templates, their views and the registry
//! - `instance` holds per-instance transformation and color plus the output buffer
//! - `mesh` is the flattened vertex/color/index result of a frame

pub mod instance;
pub mod mesh;
pub mod shape;
