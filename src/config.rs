use eframe::egui::{Vec2, vec2};
use serde::Deserialize;

/// Physics constants for the layout engine.
///
/// Every field is optional in JSON; missing fields keep their defaults.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub link_distance: f32,
    /// Uniform link strength. `None` uses `1 / min(degree(source), degree(target))`.
    pub link_strength: Option<f32>,
    pub charge_strength: f32,
    pub theta: f32,
    pub charge_distance_min: f32,
    pub center_strength: f32,
    pub collision_padding: f32,
    pub collision_strength: f32,
    pub collision_iterations: usize,
    pub base_radius: f32,
    pub radius_scale: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub reheat_alpha: f32,
    pub fallback_width: f32,
    pub fallback_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            link_distance: 100.0,
            link_strength: None,
            charge_strength: -300.0,
            theta: 0.9,
            charge_distance_min: 1.0,
            center_strength: 0.1,
            collision_padding: 10.0,
            collision_strength: 0.7,
            collision_iterations: 1,
            base_radius: 15.0,
            radius_scale: 2.0,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            reheat_alpha: 0.3,
            fallback_width: 800.0,
            fallback_height: 600.0,
        }
    }
}

impl LayoutConfig {
    /// Clamps every constant into a range the integrator stays stable in.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };

        Self {
            link_distance: finite_or(self.link_distance, defaults.link_distance).clamp(1.0, 2_000.0),
            link_strength: self
                .link_strength
                .filter(|strength| strength.is_finite())
                .map(|strength| strength.clamp(0.0, 2.0)),
            charge_strength: finite_or(self.charge_strength, defaults.charge_strength)
                .clamp(-10_000.0, 10_000.0),
            theta: finite_or(self.theta, defaults.theta).clamp(0.1, 2.0),
            charge_distance_min: finite_or(self.charge_distance_min, defaults.charge_distance_min)
                .clamp(0.01, 100.0),
            center_strength: finite_or(self.center_strength, defaults.center_strength)
                .clamp(0.0, 1.0),
            collision_padding: finite_or(self.collision_padding, defaults.collision_padding)
                .clamp(0.0, 200.0),
            collision_strength: finite_or(self.collision_strength, defaults.collision_strength)
                .clamp(0.0, 1.0),
            collision_iterations: self.collision_iterations.clamp(1, 8),
            base_radius: finite_or(self.base_radius, defaults.base_radius).clamp(1.0, 200.0),
            radius_scale: finite_or(self.radius_scale, defaults.radius_scale).clamp(0.0, 50.0),
            alpha_min: finite_or(self.alpha_min, defaults.alpha_min).clamp(0.000_01, 0.5),
            alpha_decay: finite_or(self.alpha_decay, defaults.alpha_decay).clamp(0.000_1, 0.5),
            velocity_decay: finite_or(self.velocity_decay, defaults.velocity_decay)
                .clamp(0.0, 0.99),
            reheat_alpha: finite_or(self.reheat_alpha, defaults.reheat_alpha).clamp(0.0, 1.0),
            fallback_width: finite_or(self.fallback_width, defaults.fallback_width)
                .clamp(1.0, 100_000.0),
            fallback_height: finite_or(self.fallback_height, defaults.fallback_height)
                .clamp(1.0, 100_000.0),
        }
    }

    /// Rendered radius of a node: `base + frequency * scale`.
    pub fn node_radius(&self, frequency: u8) -> f32 {
        self.base_radius + f32::from(frequency) * self.radius_scale
    }

    /// Radius the collision force keeps clear around a node.
    pub fn collision_radius(&self, frequency: u8) -> f32 {
        self.node_radius(frequency) + self.collision_padding
    }

    pub fn fallback_viewport(&self) -> Vec2 {
        vec2(self.fallback_width, self.fallback_height)
    }
}
