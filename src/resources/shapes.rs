//! Procedural board and pole shapes.
//!
//! Both shapes are axis-aligned boxes with four vertices per face so that a
//! renderer recomputing normals gets flat-shaded faces.

use crate::{data_structures::shape::ShapeTemplate, error::Result};

/// Box spanning `min..max`, 24 vertices and 12 counter-clockwise triangles.
pub fn generate_box(name: &str, min: [f32; 3], max: [f32; 3]) -> Result<ShapeTemplate> {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;

    let vertices = vec![
        // +z
        [x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1],
        // -z
        [x0, y0, z0], [x0, y1, z0], [x1, y1, z0], [x1, y0, z0],
        // -x
        [x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0],
        // +x
        [x1, y0, z1], [x1, y0, z0], [x1, y1, z0], [x1, y1, z1],
        // +y
        [x0, y1, z1], [x1, y1, z1], [x1, y1, z0], [x0, y1, z0],
        // -y
        [x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1],
    ];

    let indices = (0..6u32)
        .flat_map(|face| {
            let b = face * 4;
            [b, b + 1, b + 2, b + 2, b + 3, b]
        })
        .collect();

    ShapeTemplate::new(name, vertices, indices)
}

/// A plank one stride long along y, centered on its origin.
pub fn board(stride: f32, thickness: f32) -> Result<ShapeTemplate> {
    let (h, t) = (stride * 0.5, thickness * 0.5);
    generate_box("board", [-t, -h, -t], [t, h, t])
}

/// A square column rising one stride along +z from its origin.
pub fn pole(stride: f32, thickness: f32) -> Result<ShapeTemplate> {
    let t = thickness * 0.5;
    generate_box("pole", [-t, -t, 0.0], [t, t, stride])
}
