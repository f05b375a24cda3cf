//! Scene configuration.
//!
//! A [`SceneConfig`] is immutable for the duration of one generation call.
//! The defaults reproduce the reference look: 80 poles scattered over a disk
//! of radius 1.25, red and blue emitters on 40% of the poles.

use cgmath::Vector4;

use crate::error::{GenerationError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub pole_count: u32,
    /// Radius of the disk the pole bases are scattered over.
    pub base_range: f32,
    /// Distance between two nodes along a pole. Also the board/pole template size.
    pub node_stride: f32,
    /// Time a single node takes from appearing to vanishing.
    pub lifetime: f32,
    /// Spin of a whole pole over one lifetime, in radians.
    pub rotation: f32,
    /// Extra twist applied while a node fades, in radians.
    pub twist: f32,
    /// Upper bound of the per-pole start delay.
    pub pole_delay: f32,
    /// Delay per unit of height before a node appears.
    pub node_delay: f32,
    /// Fraction of the lifetime spent fading in (and out). In `[0, 0.5]`.
    pub fade_range: f32,
    /// Fraction of poles carrying an emitter. In `[0, 1]`.
    pub emission_rate: f32,
    pub emission_color1: Vector4<f32>,
    pub emission_color2: Vector4<f32>,
    pub emission_intensity: f32,
    pub seed: u32,
    /// Hard cap on node-loop iterations per pole. Set far above the length
    /// a valid decay produces, so it bounds capacity without shaping poles.
    pub max_nodes: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            pole_count: 80,
            base_range: 1.25,
            node_stride: 0.1,
            lifetime: 5.0,
            rotation: 1.0,
            twist: 0.5,
            pole_delay: 2.0,
            node_delay: 0.5,
            fade_range: 0.2,
            emission_rate: 0.4,
            emission_color1: Vector4::new(1.0, 0.0, 0.0, 1.0),
            emission_color2: Vector4::new(0.0, 0.0, 1.0, 1.0),
            emission_intensity: 600.0,
            seed: 10,
            max_nodes: 1024,
        }
    }
}

/// Instances a single node can emit: board, pole and emitter for each of the
/// four rotations.
pub const INSTANCES_PER_NODE: usize = 4 * 3;

impl SceneConfig {
    /// Worst-case number of instances one generation call can produce.
    pub fn instance_capacity(&self) -> usize {
        self.pole_count as usize * (self.max_nodes as usize * INSTANCES_PER_NODE + 1)
    }

    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("base_range", self.base_range),
            ("node_stride", self.node_stride),
            ("lifetime", self.lifetime),
            ("rotation", self.rotation),
            ("twist", self.twist),
            ("pole_delay", self.pole_delay),
            ("node_delay", self.node_delay),
            ("fade_range", self.fade_range),
            ("emission_rate", self.emission_rate),
            ("emission_intensity", self.emission_intensity),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(invalid(field, format!("must be finite, got {value}")));
            }
        }
        for (field, color) in [
            ("emission_color1", self.emission_color1),
            ("emission_color2", self.emission_color2),
        ] {
            if ![color.x, color.y, color.z, color.w].iter().all(|c| c.is_finite()) {
                return Err(invalid(field, format!("must be finite, got {color:?}")));
            }
        }
        if self.node_stride <= 0.0 {
            return Err(invalid("node_stride", format!("must be > 0, got {}", self.node_stride)));
        }
        if self.lifetime <= 0.0 {
            return Err(invalid("lifetime", format!("must be > 0, got {}", self.lifetime)));
        }
        if !(0.0..=0.5).contains(&self.fade_range) {
            return Err(invalid(
                "fade_range",
                format!("must lie in [0, 0.5], got {}", self.fade_range),
            ));
        }
        if !(0.0..=1.0).contains(&self.emission_rate) {
            return Err(invalid(
                "emission_rate",
                format!("must lie in [0, 1], got {}", self.emission_rate),
            ));
        }
        for (field, value) in [
            ("base_range", self.base_range),
            ("pole_delay", self.pole_delay),
            ("node_delay", self.node_delay),
        ] {
            if value < 0.0 {
                return Err(invalid(field, format!("must be >= 0, got {value}")));
            }
        }
        if self.max_nodes == 0 {
            return Err(invalid("max_nodes", "must be > 0".to_string()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> GenerationError {
    GenerationError::InvalidConfig { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SceneConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_stride_and_lifetime() {
        let cfg = SceneConfig { node_stride: 0.0, ..Default::default() };
        assert!(matches!(
            cfg.validate(),
            Err(GenerationError::InvalidConfig { field: "node_stride", .. })
        ));
        let cfg = SceneConfig { lifetime: -1.0, ..Default::default() };
        assert!(matches!(
            cfg.validate(),
            Err(GenerationError::InvalidConfig { field: "lifetime", .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_fractions() {
        let cfg = SceneConfig { fade_range: 0.6, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = SceneConfig { emission_rate: 1.5, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = SceneConfig { twist: f32::NAN, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn capacity_scales_with_pole_count() {
        let cfg = SceneConfig { pole_count: 2, max_nodes: 10, ..Default::default() };
        assert_eq!(cfg.instance_capacity(), 2 * (10 * 12 + 1));
        let cfg = SceneConfig { pole_count: 0, ..Default::default() };
        assert_eq!(cfg.instance_capacity(), 0);
    }
}
