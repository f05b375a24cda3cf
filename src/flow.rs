//! Per-frame mesh construction.
//!
//! A [`SceneFlow`] owns everything that outlives a single frame: the scene
//! config, the shape source, the instance buffer and the last good mesh.
//! Each call to [`SceneFlow::update`] runs one complete pass:
//!
//! 1. load the shapes into a fresh [`ShapeCache`]
//! 2. generate the instances for the given time
//! 3. assemble them into a [`CombinedMesh`]
//! 4. drop the cache
//!
//! If any step fails the pass is abandoned and the previous mesh stays
//! current.

use std::num::NonZeroUsize;

use log::warn;

use crate::{
    assembler::GeometryAssembler,
    config::SceneConfig,
    data_structures::{instance::InstanceBuffer, mesh::CombinedMesh, shape::ShapeCache},
    error::Result,
    generator::{self, GenerationStats},
    resources::ShapeSource,
};

pub struct SceneFlow<S> {
    config: SceneConfig,
    source: S,
    instances: InstanceBuffer,
    /// Set by an explicit capacity; otherwise the buffer follows the config.
    capacity_override: Option<usize>,
    workers: NonZeroUsize,
    mesh: Option<CombinedMesh>,
    last_stats: Option<GenerationStats>,
}

impl<S: ShapeSource> SceneFlow<S> {
    /// Sizes the instance buffer for the worst case of `config`.
    pub fn new(config: SceneConfig, source: S) -> Self {
        let capacity = config.instance_capacity();
        Self::build(config, source, capacity, None)
    }

    /// Uses a fixed instance buffer size; see [`SceneFlow::set_capacity`].
    pub fn with_capacity(config: SceneConfig, source: S, capacity: usize) -> Self {
        Self::build(config, source, capacity, Some(capacity))
    }

    fn build(
        config: SceneConfig,
        source: S,
        capacity: usize,
        capacity_override: Option<usize>,
    ) -> Self {
        Self {
            config,
            source,
            instances: InstanceBuffer::with_capacity(capacity),
            capacity_override,
            workers: GeometryAssembler::default_workers(),
            mesh: None,
            last_stats: None,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Swaps the config used by the next pass. Without an explicit capacity
    /// the instance buffer is resized to the new config's worst case.
    pub fn set_config(&mut self, config: SceneConfig) {
        if self.capacity_override.is_none() {
            self.resize(config.instance_capacity());
        }
        self.config = config;
    }

    /// Number of fill threads; `1` keeps assembly on the calling thread.
    pub fn set_workers(&mut self, workers: NonZeroUsize) {
        self.workers = workers;
    }

    /// Pins the instance buffer to `capacity`, independent of later config
    /// changes.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity_override = Some(capacity);
        self.resize(capacity);
    }

    /// Returns the buffer to the config's worst-case size.
    pub fn clear_capacity(&mut self) {
        self.capacity_override = None;
        self.resize(self.config.instance_capacity());
    }

    fn resize(&mut self, capacity: usize) {
        if self.instances.capacity() != capacity {
            self.instances = InstanceBuffer::with_capacity(capacity);
        }
    }

    /// Rebuilds the mesh for `time`.
    ///
    /// On failure the error is returned and [`SceneFlow::mesh`] keeps
    /// returning the mesh of the last successful pass.
    pub fn update(&mut self, time: f32) -> Result<&CombinedMesh> {
        match self.construct_mesh(time) {
            Ok((mesh, stats)) => {
                self.last_stats = Some(stats);
                Ok(&*self.mesh.insert(mesh))
            }
            Err(e) => {
                warn!("mesh update at t={time} failed, keeping previous mesh: {e}");
                Err(e)
            }
        }
    }

    fn construct_mesh(&mut self, time: f32) -> Result<(CombinedMesh, GenerationStats)> {
        let mut cache = ShapeCache::new();
        let shapes = self.source.load(&mut cache)?;

        let stats = generator::generate(&self.config, shapes, time, &mut self.instances)?;

        let mesh = GeometryAssembler::new(&cache)
            .assemble_parallel(self.instances.as_slice(), self.workers)?;
        Ok((mesh, stats))
    }

    /// The mesh of the last successful pass.
    pub fn mesh(&self) -> Option<&CombinedMesh> {
        self.mesh.as_ref()
    }

    pub fn last_stats(&self) -> Option<GenerationStats> {
        self.last_stats
    }

    pub fn instances(&self) -> &InstanceBuffer {
        &self.instances
    }
}
