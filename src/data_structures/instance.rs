//! Positioned shape instances.
//!
//! An [`Instance`] is a shape handle plus a translate/rotate-about-z/scale
//! transform and one color broadcast to every vertex. It knows how to write
//! its transformed geometry into destination slices; the assembler decides
//! where those slices live.

use cgmath::{Matrix4, Point3, Rad, Transform, Vector3, Vector4};

use crate::{
    data_structures::shape::{ShapeId, ShapeView},
    error::{GenerationError, Result},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    /// Rotation about the z axis, in radians.
    pub rotation: f32,
    pub scale: Vector3<f32>,
    pub color: Vector4<f32>,
    pub shape: ShapeId,
}

impl Instance {
    /// Identity transform, opaque black.
    pub fn new(shape: ShapeId) -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: 0.0,
            scale: Vector3::new(1.0, 1.0, 1.0),
            color: Vector4::new(0.0, 0.0, 0.0, 1.0),
            shape,
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_z(Rad(self.rotation))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Writes the transformed shape into the destination slices.
    ///
    /// `vertices` and `colors` must hold exactly `shape.vertex_count()`
    /// elements and `indices` exactly `shape.index_count()`. Source indices
    /// are shifted by `vertex_offset`, the position of `vertices[0]` in the
    /// combined buffer.
    pub fn build_geometry(
        &self,
        shape: ShapeView<'_>,
        vertices: &mut [[f32; 3]],
        colors: &mut [[f32; 4]],
        indices: &mut [u32],
        vertex_offset: u32,
    ) -> Result<()> {
        check_len("vertex", shape.vertex_count(), vertices.len())?;
        check_len("color", shape.vertex_count(), colors.len())?;
        check_len("index", shape.index_count(), indices.len())?;

        let matrix = self.to_matrix();
        for (dst, src) in vertices.iter_mut().zip(shape.vertices) {
            *dst = matrix.transform_point(Point3::from(*src)).into();
        }

        colors.fill(self.color.into());

        for (dst, src) in indices.iter_mut().zip(shape.indices) {
            *dst = src + vertex_offset;
        }
        Ok(())
    }
}

fn check_len(buffer: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(GenerationError::BufferSize {
            buffer,
            expected,
            actual,
        })
    }
}

/// Fixed-capacity output buffer for generated instances.
///
/// The capacity is chosen by the caller and never grows; pushing past it is
/// an error rather than a reallocation. The backing storage is kept between
/// frames and only cleared.
#[derive(Debug)]
pub struct InstanceBuffer {
    instances: Vec<Instance>,
    capacity: usize,
}

impl InstanceBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&mut self, instance: Instance) -> Result<()> {
        if self.instances.len() >= self.capacity {
            return Err(GenerationError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.instances.push(instance);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn as_slice(&self) -> &[Instance] {
        &self.instances
    }
}
