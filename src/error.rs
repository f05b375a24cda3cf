use thiserror::Error;

/// Failures of a generation/assembly pass.
///
/// All of these are caller errors: the pass is aborted and nothing partial
/// is produced. Callers are expected to keep displaying the previous mesh.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("invalid scene config: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    #[error("instance buffer capacity of {capacity} exceeded")]
    CapacityExceeded { capacity: usize },

    #[error("invalid shape '{name}': {reason}")]
    InvalidShape { name: String, reason: String },

    #[error("shape handle {0} is not registered in the shape cache")]
    UnknownShape(usize),

    #[error("destination {buffer} buffer holds {actual} elements, {expected} required")]
    BufferSize {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("combined mesh exceeds the u32 index range ({vertices} vertices)")]
    IndexOverflow { vertices: usize },

    #[error("shape source failed: {0}")]
    ShapeSource(String),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
