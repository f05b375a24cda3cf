//! Shape templates and their registry.
//!
//! A [`ShapeTemplate`] owns the vertex positions and triangle indices of one
//! reusable shape. Templates live in a [`ShapeCache`] for the duration of a
//! generation + assembly pass; instances only carry a [`ShapeId`] and borrow
//! a [`ShapeView`] when they actually write geometry.

use crate::error::{GenerationError, Result};

/// Immutable vertex/index data for one shape.
///
/// Index validity is checked once on construction and never again per
/// instance.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeTemplate {
    name: String,
    vertices: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl ShapeTemplate {
    pub fn new(name: &str, vertices: Vec<[f32; 3]>, indices: Vec<u32>) -> Result<Self> {
        let invalid = |reason: String| GenerationError::InvalidShape {
            name: name.to_string(),
            reason,
        };
        if indices.len() % 3 != 0 {
            return Err(invalid(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if vertices.len() > u32::MAX as usize {
            return Err(invalid(format!("{} vertices exceed the u32 range", vertices.len())));
        }
        if let Some((pos, idx)) = indices
            .iter()
            .enumerate()
            .find(|(_, i)| **i as usize >= vertices.len())
        {
            return Err(invalid(format!(
                "index {idx} at position {pos} is out of bounds for {} vertices",
                vertices.len()
            )));
        }
        Ok(Self {
            name: name.to_string(),
            vertices,
            indices,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view(&self) -> ShapeView<'_> {
        ShapeView {
            vertices: &self.vertices,
            indices: &self.indices,
        }
    }
}

/// Non-owning, read-only view of a template's buffers.
#[derive(Clone, Copy, Debug)]
pub struct ShapeView<'a> {
    pub vertices: &'a [[f32; 3]],
    pub indices: &'a [u32],
}

impl ShapeView<'_> {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

/// Handle into a [`ShapeCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeId(pub(crate) usize);

impl ShapeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Registry of templates, addressed by [`ShapeId`].
#[derive(Debug, Default)]
pub struct ShapeCache {
    shapes: Vec<ShapeTemplate>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shape: ShapeTemplate) -> ShapeId {
        self.shapes.push(shape);
        ShapeId(self.shapes.len() - 1)
    }

    pub fn get(&self, id: ShapeId) -> Option<&ShapeTemplate> {
        self.shapes.get(id.0)
    }

    pub fn view(&self, id: ShapeId) -> Result<ShapeView<'_>> {
        self.get(id)
            .map(ShapeTemplate::view)
            .ok_or(GenerationError::UnknownShape(id.0))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// The two templates the lattice is composed of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapePair {
    pub board: ShapeId,
    pub pole: ShapeId,
}
