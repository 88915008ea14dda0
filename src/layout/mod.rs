//! Force-directed layout over the upstream node/edge snapshot.
//!
//! The engine keeps its own working copy of the nodes augmented with
//! position, velocity and pin state. Every tick sums the configured forces
//! into a velocity change per node, integrates with velocity decay, and
//! writes the result into the owned [`PositionStore`]. A global `alpha`
//! scales the forces and decays toward `alpha_target`, so the layout cools
//! down and the host scheduler can stop ticking.

mod forces;
mod quadtree;

use std::collections::{HashMap, HashSet};

use eframe::egui::{Vec2, vec2};

use crate::config::LayoutConfig;
use crate::model::{Edge, Node};
use crate::positions::PositionStore;
use crate::util::stable_pair;

pub use forces::{
    CenterForce, CollideForce, Force, ForceContext, LinkForce, ManyBodyForce, Link, default_forces,
};

const SEED_JITTER: f32 = 25.0;

/// A node in the engine's working copy.
#[derive(Clone, Debug)]
pub struct LayoutNode {
    pub node: Node,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pin: Option<Vec2>,
    /// Rendered radius, without collision padding.
    pub radius: f32,
}

impl LayoutNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }

    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }
}

/// What a call to [`LayoutEngine::sync`] did with the snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Node ids or edges changed; the working copy was rebuilt from the store.
    Restructured,
    /// Same structure; only entity data (and possibly radii) was refreshed.
    Refreshed,
}

#[derive(Default)]
struct TickScratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    radii: Vec<f32>,
    deltas: Vec<Vec2>,
}

pub struct LayoutEngine {
    config: LayoutConfig,
    forces: Vec<Box<dyn Force>>,
    store: PositionStore,
    nodes: Vec<LayoutNode>,
    index_by_id: HashMap<String, usize>,
    links: Vec<Link>,
    edge_keys: HashSet<(String, String)>,
    degrees: Vec<usize>,
    viewport: Vec2,
    alpha: f32,
    alpha_target: f32,
    running: bool,
    ticks: u64,
    last_movement: f32,
    scratch: TickScratch,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig, store: PositionStore) -> Self {
        let config = config.sanitized();
        Self {
            forces: default_forces(&config),
            viewport: config.fallback_viewport(),
            config,
            store,
            nodes: Vec::new(),
            index_by_id: HashMap::new(),
            links: Vec::new(),
            edge_keys: HashSet::new(),
            degrees: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            running: false,
            ticks: 0,
            last_movement: 0.0,
            scratch: TickScratch::default(),
        }
    }

    /// Replaces the force list. The default list is link, charge, center, collide.
    pub fn set_forces(&mut self, forces: Vec<Box<dyn Force>>) {
        self.forces = forces;
    }

    pub fn force_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.forces.iter().map(|force| force.name())
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Tells the engine how large its render surface is.
    ///
    /// A zero or non-finite size means the host has not laid the surface out
    /// yet; the configured fallback viewport is used until a real size arrives.
    pub fn resize(&mut self, size: Vec2) {
        let measured = size.x >= 1.0 && size.y >= 1.0 && size.is_finite();
        let next = if measured {
            size
        } else {
            self.config.fallback_viewport()
        };

        if (next - self.viewport).length_sq() <= f32::EPSILON {
            return;
        }
        if !measured {
            tracing::debug!(width = size.x, height = size.y, "container has no size yet, using fallback");
        }

        self.viewport = next;
        if !self.nodes.is_empty() {
            self.reheat();
        }
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn center(&self) -> Vec2 {
        self.viewport * 0.5
    }

    /// Feeds a new upstream snapshot into the engine.
    ///
    /// Structure is compared by node-id set and edge set. A structural change
    /// rebuilds the working copy, seeding every known id from the position
    /// store, and reheats instead of starting over. Data-only changes update
    /// the entities in place.
    pub fn sync(&mut self, nodes: &[Node], edges: &[Edge]) -> SyncOutcome {
        let unique = dedup_last_wins(nodes);
        if unique.len() != nodes.len() {
            tracing::debug!(
                duplicates = nodes.len() - unique.len(),
                "duplicate node ids in snapshot, keeping last"
            );
        }

        let ids_unchanged = unique.len() == self.index_by_id.len()
            && unique.iter().all(|node| self.index_by_id.contains_key(&node.id));
        let edge_keys = edge_keys(edges, &unique);
        let structure_unchanged = ids_unchanged && edge_keys == self.edge_keys;

        if structure_unchanged && !self.nodes.is_empty() {
            let mut radius_changed = false;
            for node in unique {
                let Some(&index) = self.index_by_id.get(&node.id) else {
                    continue;
                };
                let radius = self.config.node_radius(node.frequency);
                let entry = &mut self.nodes[index];
                radius_changed |= (entry.radius - radius).abs() > f32::EPSILON;
                entry.radius = radius;
                entry.node.clone_from(node);
            }
            if radius_changed {
                self.reheat();
            }
            return SyncOutcome::Refreshed;
        }

        self.rebuild(&unique, edges, edge_keys);
        SyncOutcome::Restructured
    }

    fn rebuild(&mut self, nodes: &[&Node], edges: &[Edge], edge_keys: HashSet<(String, String)>) {
        let center = self.center();
        let mut previous_velocity = self
            .nodes
            .drain(..)
            .map(|entry| (entry.node.id, entry.velocity))
            .collect::<HashMap<_, _>>();

        let remembered = nodes
            .iter()
            .filter_map(|node| {
                let record = self.store.get(&node.id)?;
                Some((node.id.as_str(), record.pin().unwrap_or(record.position())))
            })
            .collect::<HashMap<_, _>>();
        let mut neighbors: HashMap<&str, Vec<&str>> = HashMap::new();
        for (source, target) in &edge_keys {
            neighbors.entry(source.as_str()).or_default().push(target.as_str());
            neighbors.entry(target.as_str()).or_default().push(source.as_str());
        }
        let seeds = SeedContext {
            remembered: &remembered,
            neighbors: &neighbors,
            center,
            link_distance: self.config.link_distance,
        };

        let mut known = 0usize;
        let mut next_nodes = Vec::with_capacity(nodes.len());
        for node in nodes {
            let radius = self.config.node_radius(node.frequency);
            let (position, pin) = match self.store.get(&node.id) {
                Some(record) => {
                    known += 1;
                    (record.position(), record.pin())
                }
                None => (seeds.position_for(&node.id), None),
            };
            let position = pin.unwrap_or(position);

            self.store.record(&node.id, position, pin);
            next_nodes.push(LayoutNode {
                velocity: previous_velocity.remove(&node.id).unwrap_or(Vec2::ZERO),
                node: (*node).clone(),
                position,
                pin,
                radius,
            });
        }

        let index_by_id = next_nodes
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut degrees = vec![0usize; next_nodes.len()];
        let mut links = Vec::with_capacity(edge_keys.len());
        for (source_id, target_id) in &edge_keys {
            if let (Some(&source), Some(&target)) =
                (index_by_id.get(source_id), index_by_id.get(target_id))
            {
                degrees[source] += 1;
                degrees[target] += 1;
                links.push(Link { source, target });
            }
        }
        links.sort_unstable_by_key(|link| (link.source, link.target));

        let dangling = edges
            .iter()
            .filter(|edge| {
                !index_by_id.contains_key(&edge.source) || !index_by_id.contains_key(&edge.target)
            })
            .count();
        if dangling > 0 {
            tracing::debug!(dangling, "dropping edges that reference unknown nodes");
        }

        let first_layout = known == 0;
        self.nodes = next_nodes;
        self.index_by_id = index_by_id;
        self.links = links;
        self.edge_keys = edge_keys;
        self.degrees = degrees;

        if self.nodes.is_empty() {
            self.running = false;
            return;
        }

        if first_layout {
            self.alpha = 1.0;
            self.running = true;
        } else {
            self.reheat();
        }
        tracing::debug!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            reused = known,
            alpha = self.alpha,
            "layout reseeded"
        );
    }

    /// Advances the simulation by one step and returns the summed node displacement.
    ///
    /// Runs regardless of the running flag, so callers can pre-warm or test
    /// the layout without a scheduler.
    pub fn tick(&mut self) -> f32 {
        let node_count = self.nodes.len();
        if node_count == 0 {
            self.last_movement = 0.0;
            return 0.0;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        let TickScratch {
            positions,
            velocities,
            radii,
            deltas,
        } = &mut self.scratch;
        positions.clear();
        velocities.clear();
        radii.clear();
        for entry in &self.nodes {
            positions.push(entry.position);
            velocities.push(entry.velocity);
            radii.push(entry.radius + self.config.collision_padding);
        }
        deltas.clear();
        deltas.resize(node_count, Vec2::ZERO);

        let context = ForceContext {
            positions: positions.as_slice(),
            velocities: velocities.as_slice(),
            radii: radii.as_slice(),
            links: &self.links,
            degrees: &self.degrees,
            center: self.viewport * 0.5,
            alpha: self.alpha,
        };
        for force in &self.forces {
            force.accumulate(&context, deltas.as_mut_slice());
        }

        let retain = 1.0 - self.config.velocity_decay;
        let mut movement = 0.0;
        for (entry, delta) in self.nodes.iter_mut().zip(deltas.iter()) {
            if let Some(pin) = entry.pin {
                movement += (pin - entry.position).length();
                entry.position = pin;
                entry.velocity = Vec2::ZERO;
            } else {
                let mut velocity = (entry.velocity + *delta) * retain;
                if !velocity.is_finite() {
                    velocity = Vec2::ZERO;
                }
                entry.velocity = velocity;
                entry.position += velocity;
                movement += velocity.length();
            }
            self.store.record(&entry.node.id, entry.position, entry.pin);
        }

        self.ticks += 1;
        self.last_movement = movement;
        movement
    }

    /// Scheduler entry point, called once per displayed frame.
    ///
    /// Ticks only while running. Returns whether the frame changed positions
    /// and the host should paint again.
    pub fn step_frame(&mut self) -> bool {
        if !self.running || self.nodes.is_empty() {
            return false;
        }

        self.tick();
        if self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min {
            self.running = false;
            tracing::debug!(ticks = self.ticks, "layout cooled");
        }
        true
    }

    /// Stops the frame loop. Must be called when the hosting view goes away.
    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!(ticks = self.ticks, alpha = self.alpha, "layout stopped");
        }
        self.running = false;
    }

    pub fn restart(&mut self) {
        if !self.nodes.is_empty() {
            self.running = true;
        }
    }

    /// Raises alpha to the moderate reheat level so the layout settles around
    /// a perturbation without starting over.
    pub fn reheat(&mut self) {
        self.alpha = self.alpha.max(self.config.reheat_alpha);
        self.restart();
    }

    pub fn set_alpha_target(&mut self, alpha_target: f32) {
        self.alpha_target = alpha_target.clamp(0.0, 1.0);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_movement(&self) -> f32 {
        self.last_movement
    }

    /// Holds a node at `position`. Forces no longer move it until [`Self::unpin`].
    pub fn pin(&mut self, id: &str, position: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        let entry = &mut self.nodes[index];
        entry.pin = Some(position);
        entry.position = position;
        entry.velocity = Vec2::ZERO;
        self.store.record(id, position, Some(position));
        true
    }

    /// Releases a pin and records the resting position as the new seed.
    pub fn unpin(&mut self, id: &str) -> Option<Vec2> {
        let &index = self.index_by_id.get(id)?;
        let entry = &mut self.nodes[index];
        entry.pin = None;
        self.store.record(id, entry.position, None);
        Some(entry.position)
    }

    /// Like [`Self::unpin`], but also clears a pin left in the store for a
    /// node that has since left the working copy.
    pub fn release_pin(&mut self, id: &str) -> Option<Vec2> {
        if self.index_by_id.contains_key(id) {
            return self.unpin(id);
        }
        let position = self.store.release(id)?;
        tracing::debug!(id, "released pin on node outside the working copy");
        Some(position)
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.node(id).map(|entry| entry.position)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Endpoints of every live link, for painting.
    pub fn link_segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.links
            .iter()
            .map(|link| (self.nodes[link.source].position, self.nodes[link.target].position))
    }

    /// Topmost node whose rendered circle contains `point`.
    pub fn node_at(&self, point: Vec2) -> Option<&LayoutNode> {
        self.nodes
            .iter()
            .rev()
            .filter(|entry| (entry.position - point).length_sq() <= entry.radius * entry.radius)
            .min_by(|a, b| {
                (a.position - point)
                    .length_sq()
                    .total_cmp(&(b.position - point).length_sq())
            })
    }

    pub fn store(&self) -> &PositionStore {
        &self.store
    }

    /// Stops the engine and hands the position memory back to the host.
    pub fn into_store(mut self) -> PositionStore {
        self.stop();
        self.store
    }
}

/// Where a node with no remembered position enters the layout.
struct SeedContext<'a> {
    remembered: &'a HashMap<&'a str, Vec2>,
    neighbors: &'a HashMap<&'a str, Vec<&'a str>>,
    center: Vec2,
    link_distance: f32,
}

impl SeedContext<'_> {
    /// One link length outside the remembered neighbors, pointing away from
    /// the settled layout. Nodes with no remembered neighbor start near the
    /// center.
    fn position_for(&self, id: &str) -> Vec2 {
        let (jx, jy) = stable_pair(id);
        let jitter = vec2(jx, jy);

        let anchors = self
            .neighbors
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|neighbor| self.remembered.get(neighbor).copied())
            .collect::<Vec<_>>();
        if anchors.is_empty() {
            return self.center + jitter * SEED_JITTER;
        }

        let anchor = anchors.iter().fold(Vec2::ZERO, |sum, p| sum + *p) / anchors.len() as f32;
        let settled = self.remembered.values().fold(Vec2::ZERO, |sum, p| sum + *p)
            / self.remembered.len() as f32;
        let mut outward = anchor - settled;
        if outward.length_sq() < 1.0 {
            outward = jitter;
        }
        if outward.length_sq() <= f32::EPSILON {
            outward = vec2(1.0, 0.0);
        }

        anchor + outward.normalized() * self.link_distance + jitter * (SEED_JITTER * 0.2)
    }
}

fn dedup_last_wins(nodes: &[Node]) -> Vec<&Node> {
    let last_index = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.as_str(), index))
        .collect::<HashMap<_, _>>();

    nodes
        .iter()
        .enumerate()
        .filter(|(index, node)| last_index.get(node.id.as_str()) == Some(index))
        .map(|(_, node)| node)
        .collect()
}

/// Undirected, deduplicated edge keys whose endpoints both exist.
fn edge_keys(edges: &[Edge], nodes: &[&Node]) -> HashSet<(String, String)> {
    let ids = nodes.iter().map(|node| node.id.as_str()).collect::<HashSet<_>>();
    edges
        .iter()
        .filter(|edge| edge.source != edge.target)
        .filter(|edge| ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()))
        .map(|edge| {
            if edge.source <= edge.target {
                (edge.source.clone(), edge.target.clone())
            } else {
                (edge.target.clone(), edge.source.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> LayoutEngine {
        let mut engine = LayoutEngine::new(LayoutConfig::default(), PositionStore::new());
        engine.resize(vec2(800.0, 600.0));
        engine
    }

    fn chain(count: usize) -> (Vec<Node>, Vec<Edge>) {
        let nodes = (0..count)
            .map(|index| Node::new(index.to_string(), format!("Concept {index}"), 50, 5))
            .collect::<Vec<_>>();
        let edges = (1..count)
            .map(|index| Edge::new((index - 1).to_string(), index.to_string()))
            .collect::<Vec<_>>();
        (nodes, edges)
    }

    #[test]
    fn empty_engine_is_a_no_op() {
        let mut engine = engine();
        assert_eq!(engine.sync(&[], &[]), SyncOutcome::Restructured);
        assert_eq!(engine.tick(), 0.0);
        assert!(!engine.step_frame());
        assert!(!engine.is_running());
    }

    #[test]
    fn new_nodes_seed_near_center() {
        let mut engine = engine();
        let (nodes, edges) = chain(5);
        engine.sync(&nodes, &edges);

        let center = engine.center();
        for entry in engine.nodes() {
            assert!((entry.position - center).length() <= SEED_JITTER * 1.5);
        }
        assert_eq!(engine.alpha(), 1.0);
        assert!(engine.is_running());
    }

    #[test]
    fn zero_sized_container_falls_back() {
        let mut engine = LayoutEngine::new(LayoutConfig::default(), PositionStore::new());
        engine.resize(Vec2::ZERO);
        assert_eq!(engine.viewport(), vec2(800.0, 600.0));
        assert!(engine.center().is_finite());
    }

    #[test]
    fn repeated_zero_size_leaves_settled_layout_alone() {
        let mut engine = engine();
        let (nodes, edges) = chain(3);
        engine.sync(&nodes, &edges);
        while engine.step_frame() {}

        for _ in 0..5 {
            engine.resize(Vec2::ZERO);
        }
        assert_eq!(engine.viewport(), vec2(800.0, 600.0));
        assert!(!engine.is_running());
    }

    #[test]
    fn new_node_seeds_outside_remembered_neighbor() {
        let mut engine = engine();
        let (nodes, edges) = chain(4);
        engine.sync(&nodes, &edges);
        while engine.step_frame() {}

        let (more_nodes, more_edges) = chain(5);
        engine.sync(&more_nodes, &more_edges);

        let neighbor = engine.position("3").expect("node 3 laid out");
        let seeded = engine.position("4").expect("node 4 seeded");
        let distance = (seeded - neighbor).length();
        let link = engine.config().link_distance;
        assert!(distance > link * 0.7 && distance < link * 1.3, "seeded {distance} away");

        let centroid = engine.nodes()[..4]
            .iter()
            .fold(Vec2::ZERO, |sum, entry| sum + entry.position)
            / 4.0;
        assert!((seeded - centroid).length() > (neighbor - centroid).length());
    }

    #[test]
    fn data_only_change_refreshes_in_place() {
        let mut engine = engine();
        let (mut nodes, edges) = chain(4);
        engine.sync(&nodes, &edges);
        for _ in 0..50 {
            engine.tick();
        }
        let alpha_before = engine.alpha();

        nodes[2].mastery = 95;
        assert_eq!(engine.sync(&nodes, &edges), SyncOutcome::Refreshed);
        assert_eq!(engine.node("2").map(|entry| entry.node.mastery), Some(95));
        assert_eq!(engine.alpha(), alpha_before);
    }

    #[test]
    fn swapped_node_with_same_count_restructures() {
        let mut engine = engine();
        let (nodes, edges) = chain(4);
        engine.sync(&nodes, &edges);

        let mut swapped = nodes.clone();
        swapped[3] = Node::new("new", "Replacement", 20, 2);
        assert_eq!(engine.sync(&swapped, &edges), SyncOutcome::Restructured);
        assert!(engine.node("new").is_some());
        assert!(engine.node("3").is_none());
    }

    #[test]
    fn duplicate_ids_keep_last() {
        let mut engine = engine();
        let nodes = vec![
            Node::new("a", "First", 10, 1),
            Node::new("b", "Other", 10, 1),
            Node::new("a", "Second", 70, 1),
        ];
        engine.sync(&nodes, &[]);

        assert_eq!(engine.nodes().len(), 2);
        assert_eq!(engine.node("a").map(|entry| entry.node.name.as_str()), Some("Second"));
    }

    #[test]
    fn restructure_reheats_instead_of_restarting() {
        let mut engine = engine();
        let (nodes, edges) = chain(6);
        engine.sync(&nodes, &edges);
        for _ in 0..400 {
            engine.step_frame();
        }
        assert!(!engine.is_running());

        let (more_nodes, more_edges) = chain(7);
        engine.sync(&more_nodes, &more_edges);
        assert!(engine.is_running());
        assert!((engine.alpha() - engine.config().reheat_alpha).abs() < 1e-6);
    }

    #[test]
    fn store_tracks_every_tick() {
        let mut engine = engine();
        let (nodes, edges) = chain(3);
        engine.sync(&nodes, &edges);
        engine.tick();

        for entry in engine.nodes() {
            let record = engine.store().get(entry.id()).expect("recorded");
            assert_eq!(record.position(), entry.position);
        }
    }

    #[test]
    fn unpin_records_resting_position() {
        let mut engine = engine();
        let (nodes, edges) = chain(3);
        engine.sync(&nodes, &edges);

        assert!(engine.pin("1", vec2(10.0, 10.0)));
        engine.tick();
        assert_eq!(engine.unpin("1"), Some(vec2(10.0, 10.0)));

        let record = engine.store().get("1").expect("recorded");
        assert_eq!(record.pin(), None);
        assert_eq!(record.position(), vec2(10.0, 10.0));
        assert!(!engine.pin("missing", Vec2::ZERO));
    }

    #[test]
    fn stop_halts_frame_loop() {
        let mut engine = engine();
        let (nodes, edges) = chain(3);
        engine.sync(&nodes, &edges);
        assert!(engine.step_frame());

        engine.stop();
        let ticks = engine.ticks();
        assert!(!engine.step_frame());
        assert_eq!(engine.ticks(), ticks);
    }

    #[test]
    fn node_at_hits_rendered_circle() {
        let mut engine = engine();
        let (nodes, edges) = chain(2);
        engine.sync(&nodes, &edges);
        engine.pin("0", vec2(100.0, 100.0));
        engine.pin("1", vec2(400.0, 100.0));

        assert_eq!(engine.node_at(vec2(105.0, 98.0)).map(LayoutNode::id), Some("0"));
        assert!(engine.node_at(vec2(250.0, 100.0)).is_none());
    }
}
