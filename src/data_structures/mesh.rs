//! The combined mesh handed to the renderer.

use crate::error::{GenerationError, Result};

/// Flat position/color/index buffers of one frame.
///
/// Recreated from scratch on every pass. `colors` runs parallel to
/// `vertices`; `indices` form triangles and use 32-bit indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CombinedMesh {
    pub vertices: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl CombinedMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Checks the buffer layout contract: parallel position/color arrays,
    /// whole triangles, every index inside the vertex array.
    pub fn validate(&self) -> Result<()> {
        if self.colors.len() != self.vertices.len() {
            return Err(GenerationError::BufferSize {
                buffer: "color",
                expected: self.vertices.len(),
                actual: self.colors.len(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(GenerationError::BufferSize {
                buffer: "index",
                expected: self.indices.len() / 3 * 3,
                actual: self.indices.len(),
            });
        }
        if let Some(max) = self.indices.iter().max() {
            if *max as usize >= self.vertices.len() {
                return Err(GenerationError::InvalidShape {
                    name: "combined".to_string(),
                    reason: format!(
                        "index {max} is out of bounds for {} vertices",
                        self.vertices.len()
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
