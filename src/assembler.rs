//! Flattening instances into one combined mesh.
//!
//! Assembly runs in two passes. [`MeshLayout::compute`] sums the vertex and
//! index counts of every instance and records each instance's offsets (a
//! serial prefix sum). The fill pass then hands every instance its own
//! disjoint sub-slices of the destination buffers, so the per-instance writes
//! need no synchronisation and can be spread over worker threads.

use std::{num::NonZeroUsize, thread};

use log::debug;

use crate::{
    data_structures::{
        instance::Instance,
        mesh::CombinedMesh,
        shape::{ShapeCache, ShapeView},
    },
    error::{GenerationError, Result},
};

/// Where one instance lands in the combined buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstanceSpan {
    pub vertex_offset: usize,
    pub vertex_count: usize,
    pub index_offset: usize,
    pub index_count: usize,
}

/// Result of the sizing pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshLayout {
    pub spans: Vec<InstanceSpan>,
    pub vertex_total: usize,
    pub index_total: usize,
}

impl MeshLayout {
    pub fn compute(instances: &[Instance], shapes: &ShapeCache) -> Result<Self> {
        let mut layout = MeshLayout {
            spans: Vec::with_capacity(instances.len()),
            ..Default::default()
        };
        for instance in instances {
            let view = shapes.view(instance.shape)?;
            layout.spans.push(InstanceSpan {
                vertex_offset: layout.vertex_total,
                vertex_count: view.vertex_count(),
                index_offset: layout.index_total,
                index_count: view.index_count(),
            });
            layout.vertex_total += view.vertex_count();
            layout.index_total += view.index_count();
        }
        if layout.vertex_total > u32::MAX as usize {
            return Err(GenerationError::IndexOverflow {
                vertices: layout.vertex_total,
            });
        }
        Ok(layout)
    }
}

/// One unit of fill work: an instance and its destination slices.
struct FillJob<'a, 'm> {
    instance: &'a Instance,
    shape: ShapeView<'a>,
    vertices: &'m mut [[f32; 3]],
    colors: &'m mut [[f32; 4]],
    indices: &'m mut [u32],
    vertex_offset: u32,
}

impl FillJob<'_, '_> {
    fn run(self) -> Result<()> {
        self.instance.build_geometry(
            self.shape,
            self.vertices,
            self.colors,
            self.indices,
            self.vertex_offset,
        )
    }
}

/// Merges generated instances into a [`CombinedMesh`].
pub struct GeometryAssembler<'s> {
    shapes: &'s ShapeCache,
}

impl<'s> GeometryAssembler<'s> {
    pub fn new(shapes: &'s ShapeCache) -> Self {
        Self { shapes }
    }

    /// Single-threaded assembly.
    pub fn assemble(&self, instances: &[Instance]) -> Result<CombinedMesh> {
        self.assemble_with(instances, 1)
    }

    /// Assembly with the fill pass spread over `workers` threads. Produces
    /// exactly the same buffers as [`GeometryAssembler::assemble`].
    pub fn assemble_parallel(&self, instances: &[Instance], workers: NonZeroUsize) -> Result<CombinedMesh> {
        self.assemble_with(instances, workers.get())
    }

    /// Worker count bounded by the available cores.
    pub fn default_workers() -> NonZeroUsize {
        thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
    }

    fn assemble_with(&self, instances: &[Instance], workers: usize) -> Result<CombinedMesh> {
        let layout = MeshLayout::compute(instances, self.shapes)?;

        let mut mesh = CombinedMesh {
            vertices: vec![[0.0; 3]; layout.vertex_total],
            colors: vec![[0.0; 4]; layout.vertex_total],
            indices: vec![0; layout.index_total],
        };

        let jobs = self.split(instances, &layout, &mut mesh)?;
        if workers <= 1 || jobs.len() < 2 {
            jobs.into_iter().try_for_each(FillJob::run)?;
        } else {
            fill_parallel(jobs, workers)?;
        }

        debug!(
            "assembled {} instances into {} vertices / {} triangles",
            instances.len(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Carves the destination buffers into per-instance slices following
    /// the layout.
    fn split<'a, 'm>(
        &'a self,
        instances: &'a [Instance],
        layout: &MeshLayout,
        mesh: &'m mut CombinedMesh,
    ) -> Result<Vec<FillJob<'a, 'm>>> {
        let mut vertices = mesh.vertices.as_mut_slice();
        let mut colors = mesh.colors.as_mut_slice();
        let mut indices = mesh.indices.as_mut_slice();
        let mut jobs = Vec::with_capacity(instances.len());

        for (instance, span) in instances.iter().zip(&layout.spans) {
            let (v, rest_v) = std::mem::take(&mut vertices).split_at_mut(span.vertex_count);
            let (c, rest_c) = std::mem::take(&mut colors).split_at_mut(span.vertex_count);
            let (i, rest_i) = std::mem::take(&mut indices).split_at_mut(span.index_count);
            vertices = rest_v;
            colors = rest_c;
            indices = rest_i;

            jobs.push(FillJob {
                instance,
                shape: self.shapes.view(instance.shape)?,
                vertices: v,
                colors: c,
                indices: i,
                // Checked against u32::MAX while computing the layout.
                vertex_offset: span.vertex_offset as u32,
            });
        }
        Ok(jobs)
    }
}

fn fill_parallel(jobs: Vec<FillJob<'_, '_>>, workers: usize) -> Result<()> {
    let chunk = jobs.len().div_ceil(workers);
    let mut batches: Vec<Vec<FillJob<'_, '_>>> = Vec::with_capacity(workers);
    let mut jobs = jobs.into_iter();
    loop {
        let batch: Vec<_> = jobs.by_ref().take(chunk).collect();
        if batch.is_empty() {
            break;
        }
        batches.push(batch);
    }

    thread::scope(|scope| {
        let handles: Vec<_> = batches
            .into_iter()
            .map(|batch| scope.spawn(move || batch.into_iter().try_for_each(FillJob::run)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Result<()>>()
    })
}

#[cfg(test)]
mod tests {
    use cgmath::{Vector3, Vector4};

    use super::*;
    use crate::data_structures::shape::{ShapeId, ShapeTemplate};

    fn cache() -> (ShapeCache, ShapeId, ShapeId) {
        let mut cache = ShapeCache::new();
        let tri = cache.insert(
            ShapeTemplate::new(
                "tri",
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                vec![0, 1, 2],
            )
            .unwrap(),
        );
        let quad = cache.insert(
            ShapeTemplate::new(
                "quad",
                vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
                vec![0, 1, 2, 2, 3, 0],
            )
            .unwrap(),
        );
        (cache, tri, quad)
    }

    fn instances(tri: ShapeId, quad: ShapeId, n: usize) -> Vec<Instance> {
        (0..n)
            .map(|i| Instance {
                position: Vector3::new(i as f32, 0.0, 0.0),
                color: Vector4::new(i as f32, 0.0, 0.0, 1.0),
                ..Instance::new(if i % 2 == 0 { tri } else { quad })
            })
            .collect()
    }

    #[test]
    fn layout_is_a_prefix_sum() {
        let (cache, tri, quad) = cache();
        let layout = MeshLayout::compute(&instances(tri, quad, 3), &cache).unwrap();
        assert_eq!(layout.vertex_total, 3 + 4 + 3);
        assert_eq!(layout.index_total, 3 + 6 + 3);
        assert_eq!(layout.spans[1].vertex_offset, 3);
        assert_eq!(layout.spans[2].vertex_offset, 7);
        assert_eq!(layout.spans[2].index_offset, 9);
    }

    #[test]
    fn indices_are_shifted_per_instance() {
        let (cache, tri, quad) = cache();
        let mesh = GeometryAssembler::new(&cache)
            .assemble(&instances(tri, quad, 2))
            .unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5, 5, 6, 3]);
        assert_eq!(mesh.colors[3], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[4], [2.0, 0.0, 0.0]);
        assert_eq!(mesh.validate(), Ok(()));
    }

    #[test]
    fn parallel_matches_serial() {
        let (cache, tri, quad) = cache();
        let list = instances(tri, quad, 101);
        let assembler = GeometryAssembler::new(&cache);
        let serial = assembler.assemble(&list).unwrap();
        let parallel = assembler
            .assemble_parallel(&list, NonZeroUsize::new(4).unwrap())
            .unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn empty_input_gives_empty_mesh() {
        let (cache, _, _) = cache();
        let mesh = GeometryAssembler::new(&cache)
            .assemble_parallel(&[], GeometryAssembler::default_workers())
            .unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn unknown_shape_is_rejected() {
        let (cache, _, _) = cache();
        let err = GeometryAssembler::new(&cache)
            .assemble(&[Instance::new(ShapeId(9))])
            .unwrap_err();
        assert_eq!(err, GenerationError::UnknownShape(9));
    }
}
