#![allow(dead_code)]

use lattice_ngin::{
    GenerationStats, Instance, InstanceBuffer, SceneConfig, ShapeCache, ShapePair, generate,
    resources::{BuiltinShapes, ShapeSource},
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Cache filled with the built-in shapes for the config's stride.
pub fn builtin_cache(config: &SceneConfig) -> (ShapeCache, ShapePair) {
    let mut cache = ShapeCache::new();
    let shapes = BuiltinShapes::new(config.node_stride)
        .load(&mut cache)
        .expect("built-in shapes are valid");
    (cache, shapes)
}

/// Generates into a buffer sized to the worst case of the config.
pub fn generate_scene(config: &SceneConfig, time: f32) -> (Vec<Instance>, GenerationStats) {
    generate_scene_with_capacity(config, time, config.instance_capacity())
}

/// Generates into a buffer of a fixed size, for configs whose worst case
/// is too large to allocate.
pub fn generate_scene_with_capacity(
    config: &SceneConfig,
    time: f32,
    capacity: usize,
) -> (Vec<Instance>, GenerationStats) {
    init_logging();
    let (_, shapes) = builtin_cache(config);
    let mut out = InstanceBuffer::with_capacity(capacity);
    let stats = generate(config, shapes, time, &mut out).expect("generation succeeds");
    (out.as_slice().to_vec(), stats)
}

/// Bit patterns of every field, for exact comparisons.
pub fn fingerprint(instances: &[Instance]) -> Vec<u32> {
    instances
        .iter()
        .flat_map(|i| {
            let floats = [
                i.position.x,
                i.position.y,
                i.position.z,
                i.rotation,
                i.scale.x,
                i.scale.y,
                i.scale.z,
                i.color.x,
                i.color.y,
                i.color.z,
                i.color.w,
            ];
            floats
                .into_iter()
                .map(f32::to_bits)
                .chain([i.shape.index() as u32])
                .collect::<Vec<_>>()
        })
        .collect()
}
