use eframe::egui::Vec2;

use crate::config::LayoutConfig;
use crate::util::fallback_direction;

use super::quadtree::QuadNode;

/// Edge between two working-copy indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub source: usize,
    pub target: usize,
}

/// Read-only view of the simulation handed to every force on a tick.
pub struct ForceContext<'a> {
    pub(super) positions: &'a [Vec2],
    pub(super) velocities: &'a [Vec2],
    pub(super) radii: &'a [f32],
    pub(super) links: &'a [Link],
    pub(super) degrees: &'a [usize],
    pub(super) center: Vec2,
    pub(super) alpha: f32,
}

impl ForceContext<'_> {
    pub fn positions(&self) -> &[Vec2] {
        self.positions
    }

    pub fn velocities(&self) -> &[Vec2] {
        self.velocities
    }

    /// Collision radius per node (rendered radius plus padding).
    pub fn radii(&self) -> &[f32] {
        self.radii
    }

    pub fn links(&self) -> &[Link] {
        self.links
    }

    pub fn degrees(&self) -> &[usize] {
        self.degrees
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

/// One term of the force sum.
///
/// Implementations read the context and add their velocity change for each
/// node into `deltas`. They must not assume anything about the previous tick.
pub trait Force: Send {
    fn name(&self) -> &'static str;

    fn accumulate(&self, context: &ForceContext<'_>, deltas: &mut [Vec2]);
}

/// Builds the standard link, repulsion, center and collision forces.
pub fn default_forces(config: &LayoutConfig) -> Vec<Box<dyn Force>> {
    vec![
        Box::new(LinkForce {
            distance: config.link_distance,
            strength: config.link_strength,
        }),
        Box::new(ManyBodyForce {
            strength: config.charge_strength,
            theta: config.theta,
            distance_min: config.charge_distance_min,
        }),
        Box::new(CenterForce {
            strength: config.center_strength,
        }),
        Box::new(CollideForce {
            strength: config.collision_strength,
            iterations: config.collision_iterations,
        }),
    ]
}

/// Spring pulling linked nodes toward a rest distance.
pub struct LinkForce {
    pub distance: f32,
    pub strength: Option<f32>,
}

impl Force for LinkForce {
    fn name(&self) -> &'static str {
        "link"
    }

    fn accumulate(&self, context: &ForceContext<'_>, deltas: &mut [Vec2]) {
        let node_count = context.positions.len();
        for link in context.links {
            let (source, target) = (link.source, link.target);
            if source >= node_count || target >= node_count || source == target {
                continue;
            }

            let source_degree = context.degrees[source].max(1) as f32;
            let target_degree = context.degrees[target].max(1) as f32;
            let strength = self
                .strength
                .unwrap_or_else(|| 1.0 / source_degree.min(target_degree));
            let bias = source_degree / (source_degree + target_degree);

            let mut delta = (context.positions[target] + context.velocities[target])
                - (context.positions[source] + context.velocities[source]);
            if delta.length_sq() <= f32::EPSILON {
                delta = fallback_direction(source, target) * 1e-3;
            }
            let distance = delta.length();
            let correction = delta * ((distance - self.distance) / distance * context.alpha * strength);

            deltas[target] -= correction * bias;
            deltas[source] += correction * (1.0 - bias);
        }
    }
}

/// Pairwise inverse-distance repulsion, approximated with a Barnes-Hut quadtree.
pub struct ManyBodyForce {
    pub strength: f32,
    pub theta: f32,
    pub distance_min: f32,
}

impl ManyBodyForce {
    fn accumulate_for_node(
        &self,
        cell: &QuadNode,
        index: usize,
        positions: &[Vec2],
        alpha: f32,
        delta_out: &mut Vec2,
    ) {
        if cell.mass <= 0.0 {
            return;
        }

        let point = positions[index];
        let distance_min_sq = self.distance_min * self.distance_min;

        if cell.is_leaf() {
            for &other in &cell.indices {
                if other == index {
                    continue;
                }
                let mut delta = positions[other] - point;
                if delta.length_sq() <= f32::EPSILON {
                    delta = fallback_direction(index, other) * 1e-3;
                }
                let mut distance_sq = delta.length_sq();
                if distance_sq < distance_min_sq {
                    distance_sq = (distance_min_sq * distance_sq).sqrt();
                }
                *delta_out += delta * (self.strength * alpha / distance_sq);
            }
            return;
        }

        let delta = cell.center_of_mass - point;
        let distance_sq = delta.length_sq();
        let side = cell.bounds.side_length();
        let far_enough = side * side < self.theta * self.theta * distance_sq;
        if far_enough && !cell.bounds.contains(point) {
            let distance_sq = if distance_sq < distance_min_sq {
                (distance_min_sq * distance_sq).sqrt()
            } else {
                distance_sq
            };
            *delta_out += delta * (self.strength * alpha * cell.mass / distance_sq);
            return;
        }

        for child in cell.children() {
            self.accumulate_for_node(child, index, positions, alpha, delta_out);
        }
    }
}

impl Force for ManyBodyForce {
    fn name(&self) -> &'static str {
        "charge"
    }

    fn accumulate(&self, context: &ForceContext<'_>, deltas: &mut [Vec2]) {
        if self.strength == 0.0 || context.positions.len() < 2 {
            return;
        }

        let Some(tree) = QuadNode::build(context.positions) else {
            return;
        };

        for (index, delta) in deltas.iter_mut().enumerate() {
            self.accumulate_for_node(&tree, index, context.positions, context.alpha, delta);
        }
    }
}

/// Nudges every node so the centroid drifts toward the container center.
pub struct CenterForce {
    pub strength: f32,
}

impl Force for CenterForce {
    fn name(&self) -> &'static str {
        "center"
    }

    fn accumulate(&self, context: &ForceContext<'_>, deltas: &mut [Vec2]) {
        let node_count = context.positions.len();
        if node_count == 0 || self.strength <= 0.0 {
            return;
        }

        let centroid = context.positions.iter().fold(Vec2::ZERO, |sum, p| sum + *p) / node_count as f32;
        let shift = (context.center - centroid) * self.strength;
        for delta in deltas.iter_mut() {
            *delta += shift;
        }
    }
}

/// Keeps nodes at least `radius_a + radius_b` apart, relaxed over a few passes.
pub struct CollideForce {
    pub strength: f32,
    pub iterations: usize,
}

impl CollideForce {
    fn push_apart(
        &self,
        from: usize,
        to: usize,
        predicted: &[Vec2],
        radii: &[f32],
        deltas: &mut [Vec2],
    ) {
        let min_distance = radii[from] + radii[to];
        let mut delta = predicted[from] - predicted[to];
        let mut distance_sq = delta.length_sq();
        if distance_sq >= min_distance * min_distance {
            return;
        }
        if distance_sq <= f32::EPSILON {
            delta = fallback_direction(from, to) * 1e-3;
            distance_sq = delta.length_sq();
        }

        let distance = distance_sq.sqrt();
        let overlap = (min_distance - distance) / distance * self.strength;
        let from_weight_sq = radii[from] * radii[from];
        let to_weight_sq = radii[to] * radii[to];
        let share = to_weight_sq / (from_weight_sq + to_weight_sq);

        deltas[from] += delta * (overlap * share);
        deltas[to] -= delta * (overlap * (1.0 - share));
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_pairs(
        &self,
        cell_a: &QuadNode,
        cell_b: &QuadNode,
        same_cell: bool,
        max_reach_sq: f32,
        predicted: &[Vec2],
        radii: &[f32],
        deltas: &mut [Vec2],
    ) {
        if cell_a.bounds.gap_sq(cell_b.bounds) > max_reach_sq {
            return;
        }

        if cell_a.is_leaf() && cell_b.is_leaf() {
            if same_cell {
                for (offset, &from) in cell_a.indices.iter().enumerate() {
                    for &to in &cell_a.indices[offset + 1..] {
                        self.push_apart(from, to, predicted, radii, deltas);
                    }
                }
            } else {
                for &from in &cell_a.indices {
                    for &to in &cell_b.indices {
                        self.push_apart(from, to, predicted, radii, deltas);
                    }
                }
            }
            return;
        }

        if same_cell {
            let children = cell_a.children().collect::<Vec<_>>();
            for (offset, child_a) in children.iter().enumerate() {
                self.visit_pairs(child_a, child_a, true, max_reach_sq, predicted, radii, deltas);
                for child_b in &children[offset + 1..] {
                    self.visit_pairs(child_a, child_b, false, max_reach_sq, predicted, radii, deltas);
                }
            }
            return;
        }

        let split_a = if cell_a.is_leaf() {
            false
        } else if cell_b.is_leaf() {
            true
        } else {
            cell_a.bounds.half_extent >= cell_b.bounds.half_extent
        };

        if split_a {
            for child in cell_a.children() {
                self.visit_pairs(child, cell_b, false, max_reach_sq, predicted, radii, deltas);
            }
        } else {
            for child in cell_b.children() {
                self.visit_pairs(cell_a, child, false, max_reach_sq, predicted, radii, deltas);
            }
        }
    }
}

impl Force for CollideForce {
    fn name(&self) -> &'static str {
        "collide"
    }

    fn accumulate(&self, context: &ForceContext<'_>, deltas: &mut [Vec2]) {
        let node_count = context.positions.len();
        if node_count < 2 || self.strength <= 0.0 {
            return;
        }

        let max_radius = context.radii.iter().copied().fold(0.0_f32, f32::max);
        if max_radius <= 0.0 {
            return;
        }
        let max_reach = max_radius * 2.0;

        let mut predicted = Vec::with_capacity(node_count);
        for _ in 0..self.iterations.max(1) {
            predicted.clear();
            predicted.extend(
                context
                    .positions
                    .iter()
                    .zip(context.velocities)
                    .zip(deltas.iter())
                    .map(|((position, velocity), delta)| *position + *velocity + *delta),
            );

            let Some(tree) = QuadNode::build(&predicted) else {
                return;
            };
            self.visit_pairs(
                &tree,
                &tree,
                true,
                max_reach * max_reach,
                &predicted,
                context.radii,
                deltas,
            );
        }
    }
}
