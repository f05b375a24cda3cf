//! lattice-ngin
//!
//! Procedural pole-lattice generation for real-time display. A seed-driven,
//! time-varying set of branching poles is generated as a list of positioned
//! shape instances and flattened into one combined triangle mesh per frame.
//! Generation is a pure function of config, time and shapes; assembly writes
//! every instance into its own disjoint buffer range and can run in parallel.
//!
//! High-level modules
//! - `random`: deterministic hash-based random streams with sub-stream derivation
//! - `config`: scene configuration and validation
//! - `data_structures`: shape templates, instances and the combined mesh
//! - `generator`: the branching lattice generator
//! - `assembler`: flattening instances into combined vertex/color/index buffers
//! - `resources`: shape sources (built-in procedural shapes, optional GPU upload)
//! - `flow`: per-frame driver retaining the last good mesh
//!

pub mod assembler;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod generator;
pub mod random;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use assembler::{GeometryAssembler, MeshLayout};
pub use cgmath::*;
pub use config::SceneConfig;
pub use data_structures::{
    instance::{Instance, InstanceBuffer},
    mesh::CombinedMesh,
    shape::{ShapeCache, ShapeId, ShapePair, ShapeTemplate, ShapeView},
};
pub use error::GenerationError;
pub use flow::SceneFlow;
pub use generator::{GenerationStats, generate};
pub use random::{RandomStream, StreamCursor};
