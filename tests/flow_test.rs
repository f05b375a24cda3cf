use std::num::NonZeroUsize;

use lattice_ngin::{
    GenerationError, SceneConfig, SceneFlow, ShapeCache, ShapePair,
    resources::{BuiltinShapes, ShapeSource},
};

use crate::common::test_utils::init_logging;

mod common;

struct MissingAsset;

impl ShapeSource for MissingAsset {
    fn load(&self, _: &mut ShapeCache) -> Result<ShapePair, GenerationError> {
        Err(GenerationError::ShapeSource("board.obj not found".to_string()))
    }
}

#[test]
fn update_produces_a_valid_mesh() -> anyhow::Result<()> {
    init_logging();
    let config = SceneConfig::default();
    let mut flow = SceneFlow::new(config.clone(), BuiltinShapes::new(config.node_stride));
    flow.set_workers(NonZeroUsize::new(2).unwrap());

    let mesh = flow.update(2.5)?;
    assert!(mesh.vertex_count() > 0);
    mesh.validate()?;

    let stats = flow.last_stats().expect("stats after a successful pass");
    assert_eq!(stats.instances, flow.instances().len());
    assert_eq!(stats.poles, config.pole_count);
    Ok(())
}

#[test]
fn failed_update_keeps_previous_mesh() -> anyhow::Result<()> {
    init_logging();
    let config = SceneConfig::default();
    let mut flow = SceneFlow::new(config.clone(), BuiltinShapes::new(config.node_stride));
    let previous = flow.update(2.5)?.clone();

    flow.set_capacity(1);
    let err = flow.update(2.6).unwrap_err();
    assert_eq!(err, GenerationError::CapacityExceeded { capacity: 1 });
    assert_eq!(flow.mesh(), Some(&previous));

    flow.set_config(SceneConfig { node_stride: -1.0, ..config.clone() });
    flow.clear_capacity();
    assert!(matches!(
        flow.update(2.7),
        Err(GenerationError::InvalidConfig { field: "node_stride", .. })
    ));
    assert_eq!(flow.mesh(), Some(&previous));
    Ok(())
}

#[test]
fn raising_pole_count_resizes_the_buffer() -> anyhow::Result<()> {
    init_logging();
    let config = SceneConfig { pole_count: 4, ..Default::default() };
    let mut flow = SceneFlow::new(config.clone(), BuiltinShapes::new(config.node_stride));
    flow.update(2.5)?;

    let larger = SceneConfig { pole_count: 40, ..config };
    flow.set_config(larger.clone());
    assert_eq!(flow.config(), &larger);
    assert_eq!(flow.instances().capacity(), larger.instance_capacity());

    flow.update(2.5)?.validate()?;
    assert_eq!(flow.last_stats().map(|s| s.poles), Some(40));
    Ok(())
}

#[test]
fn explicit_capacity_survives_config_changes() {
    init_logging();
    let config = SceneConfig { pole_count: 4, ..Default::default() };
    let mut flow =
        SceneFlow::with_capacity(config.clone(), BuiltinShapes::new(config.node_stride), 1);
    flow.set_config(SceneConfig { pole_count: 40, ..config.clone() });
    assert_eq!(flow.instances().capacity(), 1);
    assert_eq!(
        flow.update(2.5).unwrap_err(),
        GenerationError::CapacityExceeded { capacity: 1 }
    );

    flow.clear_capacity();
    assert_eq!(flow.instances().capacity(), flow.config().instance_capacity());
    assert!(flow.update(2.5).is_ok());
}

#[test]
fn shape_source_failure_aborts_before_generation() {
    init_logging();
    let mut flow = SceneFlow::new(SceneConfig::default(), MissingAsset);
    assert!(matches!(flow.update(1.0), Err(GenerationError::ShapeSource(_))));
    assert!(flow.mesh().is_none());
    assert!(flow.instances().is_empty());
}
