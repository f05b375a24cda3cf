//! Shape loading.
//!
//! Shapes come from an external source; the generator only ever sees the
//! [`ShapeCache`] a [`ShapeSource`] filled. Failures of the source surface
//! before generation starts.

use crate::{
    data_structures::shape::{ShapeCache, ShapePair, ShapeTemplate},
    error::Result,
};

#[cfg(feature = "gpu")]
pub mod gpu;
pub mod shapes;

/// Supplies the board and pole templates for one pass.
pub trait ShapeSource {
    fn load(&self, cache: &mut ShapeCache) -> Result<ShapePair>;
}

/// Procedurally generated boxes sized for a node stride.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuiltinShapes {
    pub stride: f32,
    pub thickness: f32,
}

impl BuiltinShapes {
    pub fn new(stride: f32) -> Self {
        Self {
            stride,
            thickness: stride * 0.08,
        }
    }
}

impl ShapeSource for BuiltinShapes {
    fn load(&self, cache: &mut ShapeCache) -> Result<ShapePair> {
        let board = cache.insert(shapes::board(self.stride, self.thickness)?);
        let pole = cache.insert(shapes::pole(self.stride, self.thickness)?);
        Ok(ShapePair { board, pole })
    }
}

/// Templates loaded elsewhere, copied into every pass's cache.
#[derive(Clone, Debug)]
pub struct StaticShapes {
    pub board: ShapeTemplate,
    pub pole: ShapeTemplate,
}

impl ShapeSource for StaticShapes {
    fn load(&self, cache: &mut ShapeCache) -> Result<ShapePair> {
        let board = cache.insert(self.board.clone());
        let pole = cache.insert(self.pole.clone());
        Ok(ShapePair { board, pole })
    }
}
