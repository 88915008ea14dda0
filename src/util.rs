use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use eframe::egui::{Vec2, vec2};

/// Deterministic pair in `[-1, 1]` derived from a node id.
///
/// Seeding from the id instead of a random source keeps first placement
/// reproducible while still scattering coincident nodes apart.
pub(crate) fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Unit direction used when two points coincide and no real direction exists.
pub(crate) fn fallback_direction(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214 + 0.11) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}
