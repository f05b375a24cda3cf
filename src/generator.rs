//! Pole lattice generation.
//!
//! [`generate`] turns a [`SceneConfig`], a scene time and the board/pole
//! shape handles into an ordered list of [`Instance`]s. The result is a pure
//! function of its inputs: every pole draws from its own sub-stream of the
//! seed, so poles never influence each other's structure.
//!
//! Per pole the generator
//! 1. staggers the pole's clock by a random delay,
//! 2. picks a base position inside the disk, a base angle and an emitter color,
//! 3. walks up the pole node by node while the survival probability stays
//!    above [`SURVIVAL_THRESHOLD`], emitting boards, poles and emitters for the
//!    nodes whose lifetime window contains the current time,
//! 4. optionally emits one stretched emitter segment bridging the pole.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use cgmath::{Matrix2, Rad, Vector2, Vector3, Vector4};
use log::{debug, trace, warn};

use crate::{
    config::SceneConfig,
    data_structures::{
        instance::{Instance, InstanceBuffer},
        shape::{ShapeId, ShapePair},
    },
    error::Result,
    random::{RandomStream, StreamCursor},
};

/// The node loop keeps going while the survival probability is above this.
pub const SURVIVAL_THRESHOLD: f32 = 0.2;

/// Boards and poles are opaque black; only emitters carry color.
const BOARD_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Summary of one generation call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub instances: usize,
    pub poles: u32,
    pub emitters: u32,
    /// Longest node walk of any pole.
    pub max_node_iterations: u32,
}

/// Hermite interpolation between `edge0` and `edge1`, clamped to `[0, 1]`.
///
/// A degenerate range acts as a step at `edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge1 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Fills `out` with the instances of the scene at `time`.
///
/// `out` is cleared first. Fails without growing the buffer when the
/// scene does not fit; in that case `out` holds a truncated scene and must
/// not be assembled.
pub fn generate(
    config: &SceneConfig,
    shapes: ShapePair,
    time: f32,
    out: &mut InstanceBuffer,
) -> Result<GenerationStats> {
    config.validate()?;
    out.clear();

    let root = RandomStream::new(config.seed);
    let mut stats = GenerationStats::default();

    for i in 0..config.pole_count {
        let pole = PoleSeed::new(config, root.derive_sub(i), time);
        let iterations = pole.emit(config, shapes, out)?;
        stats.poles += 1;
        stats.emitters += pole.emission.is_some() as u32;
        stats.max_node_iterations = stats.max_node_iterations.max(iterations);
    }

    stats.instances = out.len();
    debug!(
        "generated {} instances for {} poles ({} emitters) at t={time}",
        stats.instances, stats.poles, stats.emitters
    );
    Ok(stats)
}

/// Per-pole parameters drawn up front from the pole's stream.
struct PoleSeed {
    cursor: StreamCursor,
    /// Pole-local time.
    t: f32,
    origin: Vector2<f32>,
    base_angle: f32,
    emission: Option<Vector4<f32>>,
    decay: f32,
}

impl PoleSeed {
    fn new(config: &SceneConfig, stream: RandomStream, time: f32) -> Self {
        let mut cursor = StreamCursor::new(stream);

        let t = time - cursor.float_range(0.0, config.pole_delay);
        let origin = cursor.point_in_disk() * config.base_range;
        let mut base_angle = if cursor.bool() { 0.0 } else { FRAC_PI_4 };
        base_angle += t * config.rotation / config.lifetime;
        let emission = choose_emission(config, cursor.float());
        let decay = cursor.float_range(0.1, 0.96);

        Self {
            cursor,
            t,
            origin,
            base_angle,
            emission,
            decay,
        }
    }

    /// Emits every instance of this pole. Returns the number of node-loop
    /// iterations.
    fn emit(&self, config: &SceneConfig, shapes: ShapePair, out: &mut InstanceBuffer) -> Result<u32> {
        let mut cursor = self.cursor.clone();
        let mut walk = NodeWalk::new(&mut cursor, self.decay, config.node_stride, config.max_nodes);

        for node in walk.by_ref() {
            self.emit_node(config, shapes, &node, out)?;
        }
        let (z, iterations) = (walk.z(), walk.iterations());
        if walk.capped() {
            warn!(
                "pole at ({:.3}, {:.3}) hit the node cap of {} (decay {:.3}), truncating",
                self.origin.x, self.origin.y, config.max_nodes, self.decay
            );
        }

        if let Some(color) = self.emission {
            let z = z + config.node_stride * cursor.float_range(1.0, 3.0);
            if let Some(tail) = self.tail(config, shapes.pole, color, z) {
                out.push(tail)?;
            }
        }

        trace!(
            "pole at ({:.3}, {:.3}): {iterations} nodes, decay {:.3}",
            self.origin.x, self.origin.y, self.decay
        );
        Ok(iterations)
    }

    fn emit_node(
        &self,
        config: &SceneConfig,
        shapes: ShapePair,
        node: &NodeStep,
        out: &mut InstanceBuffer,
    ) -> Result<()> {
        let node_time = (self.t - node.z * config.node_delay) / config.lifetime;
        if node_time <= 0.0 || node_time >= 1.0 {
            return Ok(());
        }

        let fade_in = smoothstep(0.0, config.fade_range, node_time);
        let fade_out = smoothstep(1.0 - config.fade_range, 1.0, node_time);
        let scale = Vector3::new(1.0, 1.0, 1.0) * (fade_in - fade_out);
        let mut angle = self.base_angle + (fade_in + fade_out) * config.twist;

        let center = Vector3::new(self.origin.x, self.origin.y, node.z);
        let half = config.node_stride * 0.5;

        for k in 0..4u32 {
            let rot = Matrix2::from_angle(Rad(angle));

            if node.stream.float(k) < node.prob {
                out.push(Instance {
                    position: center + (rot * Vector2::new(half, 0.0)).extend(0.0),
                    rotation: angle,
                    scale,
                    color: BOARD_COLOR.into(),
                    shape: shapes.board,
                })?;
            }

            out.push(Instance {
                position: center + (rot * Vector2::new(half, half)).extend(0.0),
                rotation: angle,
                scale,
                color: BOARD_COLOR.into(),
                shape: shapes.pole,
            })?;

            if let Some(color) = self.emission {
                out.push(Instance {
                    position: center,
                    rotation: angle,
                    scale,
                    color,
                    shape: shapes.pole,
                })?;
            }

            angle += FRAC_PI_2;
        }
        Ok(())
    }

    /// The stretched emitter segment running from the ground to `z_top`,
    /// growing in from below and retreating upwards as the pole expires.
    fn tail(
        &self,
        config: &SceneConfig,
        pole: ShapeId,
        color: Vector4<f32>,
        z_top: f32,
    ) -> Option<Instance> {
        let span = config.node_delay * z_top + config.fade_range * config.lifetime;
        let (f_in, f_out) = tail_ramps(self.t, config.lifetime, span);
        if !(f_in > 0.0 && f_out < 1.0) {
            return None;
        }
        let bottom = z_top * f_out;
        let length = z_top * (f_in - f_out);
        Some(Instance {
            position: Vector3::new(self.origin.x, self.origin.y, bottom),
            rotation: self.base_angle,
            scale: Vector3::new(1.0, 1.0, length / config.node_stride),
            color,
            shape: pole,
        })
    }
}

/// Growth-in and decay-out ramps of the tail segment.
///
/// Both saturate to `[0, 1]` over `span`. A zero span degenerates into
/// steps at `0` and `lifetime`.
fn tail_ramps(t: f32, lifetime: f32, span: f32) -> (f32, f32) {
    if span <= f32::EPSILON {
        let f_in = if t > 0.0 { 1.0 } else { 0.0 };
        let f_out = if t >= lifetime { 1.0 } else { 0.0 };
        return (f_in, f_out);
    }
    let f_in = (t / span).clamp(0.0, 1.0);
    let f_out = ((t - lifetime) / span).clamp(0.0, 1.0);
    (f_in, f_out)
}

/// Picks the emitter color for a draw `r` in `[0, 1)`: the first color for
/// the lower half of the emission rate, the second for the upper half, no
/// emitter otherwise.
fn choose_emission(config: &SceneConfig, r: f32) -> Option<Vector4<f32>> {
    let color = if r < config.emission_rate * 0.5 {
        config.emission_color1
    } else if r < config.emission_rate {
        config.emission_color2
    } else {
        return None;
    };
    Some(color * config.emission_intensity)
}

/// One step of a pole's node walk.
#[derive(Clone, Copy, Debug)]
pub(crate) struct NodeStep {
    pub z: f32,
    pub prob: f32,
    /// Node-local stream for the per-rotation board draws.
    pub stream: RandomStream,
}

/// Iterates the nodes of one pole, bottom to top.
///
/// Each step derives a node stream, then shrinks the survival probability
/// by a factor drawn from `[decay, 1)`. The walk ends once the probability
/// drops to the threshold or `max_nodes` steps were taken.
pub(crate) struct NodeWalk<'c> {
    cursor: &'c mut StreamCursor,
    decay: f32,
    stride: f32,
    max_nodes: u32,
    z: f32,
    prob: f32,
    iterations: u32,
}

impl<'c> NodeWalk<'c> {
    pub fn new(cursor: &'c mut StreamCursor, decay: f32, stride: f32, max_nodes: u32) -> Self {
        Self {
            cursor,
            decay,
            stride,
            max_nodes,
            z: 0.0,
            prob: 1.0,
            iterations: 0,
        }
    }

    /// Height of the next node, i.e. one stride past the last one visited.
    pub fn z(&self) -> f32 {
        self.z
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Whether the walk stopped on `max_nodes` while the pole was still alive.
    pub fn capped(&self) -> bool {
        self.iterations >= self.max_nodes && self.prob > SURVIVAL_THRESHOLD
    }
}

impl Iterator for NodeWalk<'_> {
    type Item = NodeStep;

    fn next(&mut self) -> Option<NodeStep> {
        if self.prob <= SURVIVAL_THRESHOLD || self.iterations >= self.max_nodes {
            return None;
        }
        let step = NodeStep {
            z: self.z,
            prob: self.prob,
            stream: self.cursor.derive_sub(),
        };
        self.iterations += 1;
        self.z += self.stride;
        self.prob *= self.cursor.float_range(self.decay, 1.0);
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes() -> ShapePair {
        ShapePair {
            board: ShapeId(0),
            pole: ShapeId(1),
        }
    }

    #[test]
    fn smoothstep_envelope() {
        assert_eq!(smoothstep(0.0, 0.2, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 0.2, 0.1), 0.5);
        assert_eq!(smoothstep(0.0, 0.2, 0.3), 1.0);
        assert_eq!(smoothstep(0.5, 0.5, 0.4), 0.0);
        assert_eq!(smoothstep(0.5, 0.5, 0.6), 1.0);
    }

    #[test]
    fn node_probability_never_increases() {
        for seed in 0..50 {
            let mut cursor = StreamCursor::new(RandomStream::new(seed));
            let decay = cursor.float_range(0.1, 0.96);
            let probs: Vec<f32> = NodeWalk::new(&mut cursor, decay, 0.1, 1000)
                .map(|n| n.prob)
                .collect();
            assert!(!probs.is_empty());
            assert_eq!(probs[0], 1.0);
            assert!(probs.windows(2).all(|w| w[1] <= w[0]), "seed {seed}: {probs:?}");
            assert!(probs.iter().all(|p| *p > SURVIVAL_THRESHOLD));
        }
    }

    #[test]
    fn node_walk_respects_iteration_cap() {
        let mut cursor = StreamCursor::new(RandomStream::new(1));
        let mut walk = NodeWalk::new(&mut cursor, 0.999, 0.1, 5);
        assert_eq!(walk.by_ref().count(), 5);
        assert_eq!(walk.iterations(), 5);
        assert!(walk.capped());
        assert!((walk.z() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn default_cap_never_truncates_a_natural_walk() {
        let cap = SceneConfig::default().max_nodes;
        for seed in 0..2_000 {
            let mut cursor = StreamCursor::new(RandomStream::new(seed));
            let decay = cursor.float_range(0.1, 0.96);
            let mut walk = NodeWalk::new(&mut cursor, decay, 0.1, cap);
            let _ = walk.by_ref().count();
            assert!(!walk.capped(), "seed {seed} ran {} nodes", walk.iterations());
            assert!(walk.iterations() < cap);
        }
    }

    #[test]
    fn emission_choice_splits_rate() {
        let cfg = SceneConfig {
            emission_rate: 0.4,
            emission_intensity: 2.0,
            ..Default::default()
        };
        assert_eq!(choose_emission(&cfg, 0.1), Some(cfg.emission_color1 * 2.0));
        assert_eq!(choose_emission(&cfg, 0.3), Some(cfg.emission_color2 * 2.0));
        assert_eq!(choose_emission(&cfg, 0.4), None);
        let none = SceneConfig { emission_rate: 0.0, ..Default::default() };
        assert_eq!(choose_emission(&none, 0.0), None);
    }

    #[test]
    fn tail_ramps_guard_zero_span() {
        assert_eq!(tail_ramps(1.0, 5.0, 0.0), (1.0, 0.0));
        assert_eq!(tail_ramps(-1.0, 5.0, 0.0), (0.0, 0.0));
        assert_eq!(tail_ramps(6.0, 5.0, 0.0), (1.0, 1.0));
        let (f_in, f_out) = tail_ramps(0.5, 5.0, 1.0);
        assert_eq!((f_in, f_out), (0.5, 0.0));
    }

    #[test]
    fn zero_fade_range_does_not_produce_nan() {
        let cfg = SceneConfig {
            pole_count: 4,
            fade_range: 0.0,
            node_delay: 0.0,
            emission_rate: 1.0,
            ..Default::default()
        };
        let mut out = InstanceBuffer::with_capacity(cfg.instance_capacity());
        generate(&cfg, shapes(), 2.5, &mut out).unwrap();
        assert!(!out.is_empty());
        for i in out.as_slice() {
            assert!(i.position.x.is_finite() && i.position.z.is_finite());
            assert!(i.scale.x.is_finite() && i.scale.z.is_finite());
        }
    }

    #[test]
    fn invalid_config_fails_before_touching_output() {
        let cfg = SceneConfig { lifetime: 0.0, ..Default::default() };
        let mut out = InstanceBuffer::with_capacity(16);
        assert!(generate(&cfg, shapes(), 0.0, &mut out).is_err());
        assert!(out.is_empty());
    }
}
