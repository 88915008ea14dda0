use eframe::egui::Vec2;

use crate::layout::LayoutEngine;
use crate::model::{Node, NodeId};

/// Pointer movement under which a press/release pair counts as a click.
pub const CLICK_SLOP: f32 = 4.0;

/// Pointer input in layout (world) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
    /// The gesture was interrupted (focus loss, pointer left the window).
    Cancel,
}

/// Anything that can hand over the pointer events gathered since the last frame.
pub trait PointerEventSource {
    fn drain_events(&mut self) -> Vec<PointerEvent>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionEvent {
    /// A node was clicked. Carries the upstream entity, not the layout copy.
    Selected(Node),
    DragStarted(NodeId),
    DragEnded { id: NodeId, position: Vec2 },
}

#[derive(Clone, Debug)]
struct Gesture {
    target: Option<NodeId>,
    press: Vec2,
    grab_offset: Vec2,
    dragging: bool,
}

/// Turns pointer gestures into pins on the layout engine and node selections.
#[derive(Clone, Debug)]
pub struct InteractionController {
    click_slop: f32,
    gesture: Option<Gesture>,
    selected: Option<NodeId>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(CLICK_SLOP)
    }
}

impl InteractionController {
    pub fn new(click_slop: f32) -> Self {
        Self {
            click_slop: click_slop.max(0.0),
            gesture: None,
            selected: None,
        }
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        engine: &mut LayoutEngine,
        upstream: &[Node],
    ) -> Option<InteractionEvent> {
        match event {
            PointerEvent::Down(point) => self.press(point, engine),
            PointerEvent::Move(point) => self.drag_to(point, engine),
            PointerEvent::Up(_) => self.release(engine, upstream, true),
            PointerEvent::Cancel => self.release(engine, upstream, false),
        }
    }

    /// Feeds every pending event from `source` through [`Self::handle`].
    pub fn pump(
        &mut self,
        source: &mut impl PointerEventSource,
        engine: &mut LayoutEngine,
        upstream: &[Node],
    ) -> Vec<InteractionEvent> {
        source
            .drain_events()
            .into_iter()
            .filter_map(|event| self.handle(event, engine, upstream))
            .collect()
    }

    fn press(&mut self, point: Vec2, engine: &mut LayoutEngine) -> Option<InteractionEvent> {
        // A press without a matching release ends the stale gesture first.
        let stale = self.finish_drag(engine);

        let hit = engine.node_at(point);
        self.gesture = Some(Gesture {
            target: hit.map(|entry| entry.node.id.clone()),
            press: point,
            grab_offset: hit.map(|entry| entry.position - point).unwrap_or(Vec2::ZERO),
            dragging: false,
        });
        stale
    }

    fn drag_to(&mut self, point: Vec2, engine: &mut LayoutEngine) -> Option<InteractionEvent> {
        let gesture = self.gesture.as_mut()?;
        let id = gesture.target.clone()?;

        let mut started = None;
        if !gesture.dragging {
            if (point - gesture.press).length() <= self.click_slop {
                return None;
            }
            let current = engine.position(&id)?;
            gesture.dragging = true;
            engine.set_alpha_target(engine.config().reheat_alpha);
            engine.restart();
            engine.pin(&id, current);
            started = Some(InteractionEvent::DragStarted(id.clone()));
        }

        engine.pin(&id, point + gesture.grab_offset);
        started
    }

    fn release(
        &mut self,
        engine: &mut LayoutEngine,
        upstream: &[Node],
        allow_click: bool,
    ) -> Option<InteractionEvent> {
        let dragging = self.gesture.as_ref()?.dragging;
        if dragging {
            return self.finish_drag(engine);
        }

        let gesture = self.gesture.take()?;
        if !allow_click {
            return None;
        }
        let id = gesture.target?;
        let node = upstream.iter().find(|node| node.id == id)?;
        self.selected = Some(id);
        Some(InteractionEvent::Selected(node.clone()))
    }

    fn finish_drag(&mut self, engine: &mut LayoutEngine) -> Option<InteractionEvent> {
        let gesture = self.gesture.take()?;
        if !gesture.dragging {
            return None;
        }
        let id = gesture.target?;

        engine.set_alpha_target(0.0);
        let position = engine.release_pin(&id)?;
        Some(InteractionEvent::DragEnded { id, position })
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.as_ref().is_some_and(|gesture| gesture.dragging)
    }

    pub fn dragged_id(&self) -> Option<&str> {
        self.gesture
            .as_ref()
            .filter(|gesture| gesture.dragging)
            .and_then(|gesture| gesture.target.as_deref())
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Current upstream entity for the selection, looked up fresh each call.
    pub fn selected_node<'a>(&self, upstream: &'a [Node]) -> Option<&'a Node> {
        let id = self.selected.as_deref()?;
        upstream.iter().find(|node| node.id == id)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::config::LayoutConfig;
    use crate::model::Edge;
    use crate::positions::PositionStore;

    fn setup() -> (LayoutEngine, Vec<Node>) {
        let nodes = vec![
            Node::new("a", "Neural Networks", 85, 8),
            Node::new("b", "Backpropagation", 45, 5),
        ];
        let mut engine = LayoutEngine::new(LayoutConfig::default(), PositionStore::new());
        engine.sync(&nodes, &[Edge::new("a", "b")]);
        engine.pin("a", vec2(100.0, 100.0));
        engine.pin("b", vec2(400.0, 300.0));
        engine.unpin("a");
        engine.unpin("b");
        (engine, nodes)
    }

    #[test]
    fn click_selects_without_moving() {
        let (mut engine, nodes) = setup();
        let mut controller = InteractionController::default();
        let before = engine.position("a");

        assert_eq!(controller.handle(PointerEvent::Down(vec2(101.0, 99.0)), &mut engine, &nodes), None);
        controller.handle(PointerEvent::Move(vec2(102.0, 99.0)), &mut engine, &nodes);
        let event = controller.handle(PointerEvent::Up(vec2(102.0, 99.0)), &mut engine, &nodes);

        assert_eq!(event, Some(InteractionEvent::Selected(nodes[0].clone())));
        assert_eq!(controller.selected_id(), Some("a"));
        assert_eq!(engine.position("a"), before);
        assert!(!engine.node("a").is_some_and(|entry| entry.is_pinned()));
    }

    #[test]
    fn drag_pins_then_releases() {
        let (mut engine, nodes) = setup();
        let mut controller = InteractionController::default();

        controller.handle(PointerEvent::Down(vec2(100.0, 100.0)), &mut engine, &nodes);
        let started = controller.handle(PointerEvent::Move(vec2(150.0, 120.0)), &mut engine, &nodes);
        assert_eq!(started, Some(InteractionEvent::DragStarted("a".to_owned())));
        assert!(controller.is_dragging());
        assert_eq!(engine.alpha_target(), engine.config().reheat_alpha);
        assert_eq!(engine.node("a").and_then(|entry| entry.pin), Some(vec2(150.0, 120.0)));

        for _ in 0..10 {
            engine.tick();
            assert_eq!(engine.position("a"), Some(vec2(150.0, 120.0)));
        }

        let ended = controller.handle(PointerEvent::Up(vec2(150.0, 120.0)), &mut engine, &nodes);
        assert_eq!(
            ended,
            Some(InteractionEvent::DragEnded {
                id: "a".to_owned(),
                position: vec2(150.0, 120.0),
            })
        );
        assert_eq!(engine.alpha_target(), 0.0);
        assert!(engine.node("a").is_some_and(|entry| !entry.is_pinned()));
        let record = engine.store().get("a").expect("recorded");
        assert_eq!(record.pin(), None);
        assert_eq!(record.position(), vec2(150.0, 120.0));
        assert_eq!(controller.selected_id(), None);
    }

    #[test]
    fn grab_offset_prevents_jump() {
        let (mut engine, nodes) = setup();
        let mut controller = InteractionController::default();

        controller.handle(PointerEvent::Down(vec2(110.0, 100.0)), &mut engine, &nodes);
        controller.handle(PointerEvent::Move(vec2(130.0, 100.0)), &mut engine, &nodes);
        assert_eq!(engine.position("a"), Some(vec2(120.0, 100.0)));
    }

    #[test]
    fn move_after_release_is_ignored() {
        let (mut engine, nodes) = setup();
        let mut controller = InteractionController::default();

        controller.handle(PointerEvent::Down(vec2(100.0, 100.0)), &mut engine, &nodes);
        controller.handle(PointerEvent::Move(vec2(160.0, 100.0)), &mut engine, &nodes);
        controller.handle(PointerEvent::Up(vec2(160.0, 100.0)), &mut engine, &nodes);

        assert_eq!(controller.handle(PointerEvent::Move(vec2(500.0, 500.0)), &mut engine, &nodes), None);
        assert!(engine.node("a").is_some_and(|entry| !entry.is_pinned()));
        assert_eq!(engine.position("a"), Some(vec2(160.0, 100.0)));
    }

    #[test]
    fn background_press_does_nothing() {
        let (mut engine, nodes) = setup();
        let mut controller = InteractionController::default();

        controller.handle(PointerEvent::Down(vec2(700.0, 20.0)), &mut engine, &nodes);
        assert_eq!(controller.handle(PointerEvent::Move(vec2(760.0, 90.0)), &mut engine, &nodes), None);
        assert_eq!(controller.handle(PointerEvent::Up(vec2(760.0, 90.0)), &mut engine, &nodes), None);
        assert_eq!(controller.selected_id(), None);
    }

    #[test]
    fn selection_reads_current_upstream_entity() {
        let (mut engine, mut nodes) = setup();
        let mut controller = InteractionController::default();

        controller.handle(PointerEvent::Down(vec2(400.0, 300.0)), &mut engine, &nodes);
        controller.handle(PointerEvent::Up(vec2(400.0, 300.0)), &mut engine, &nodes);

        nodes[1].mastery = 77;
        assert_eq!(controller.selected_node(&nodes).map(|node| node.mastery), Some(77));
        controller.clear_selection();
        assert!(controller.selected_node(&nodes).is_none());
    }

    #[test]
    fn cancel_releases_pin_without_selecting() {
        let (mut engine, nodes) = setup();
        let mut controller = InteractionController::default();

        controller.handle(PointerEvent::Down(vec2(100.0, 100.0)), &mut engine, &nodes);
        controller.handle(PointerEvent::Move(vec2(140.0, 100.0)), &mut engine, &nodes);
        let event = controller.handle(PointerEvent::Cancel, &mut engine, &nodes);

        assert!(matches!(event, Some(InteractionEvent::DragEnded { .. })));
        assert!(engine.node("a").is_some_and(|entry| !entry.is_pinned()));
        assert_eq!(controller.selected_id(), None);
    }

    #[test]
    fn drag_end_releases_node_dropped_mid_drag() {
        let (mut engine, nodes) = setup();
        let mut controller = InteractionController::default();

        controller.handle(PointerEvent::Down(vec2(100.0, 100.0)), &mut engine, &nodes);
        controller.handle(PointerEvent::Move(vec2(160.0, 130.0)), &mut engine, &nodes);
        engine.sync(&nodes[1..], &[]);
        assert!(engine.node("a").is_none());

        let ended = controller.handle(PointerEvent::Up(vec2(160.0, 130.0)), &mut engine, &nodes[1..]);
        assert_eq!(
            ended,
            Some(InteractionEvent::DragEnded {
                id: "a".to_owned(),
                position: vec2(160.0, 130.0),
            })
        );
        assert_eq!(engine.store().get("a").and_then(|record| record.pin()), None);

        engine.sync(&nodes, &[Edge::new("a", "b")]);
        assert!(engine.node("a").is_some_and(|entry| !entry.is_pinned()));
        for _ in 0..100 {
            engine.tick();
        }
        assert_ne!(engine.position("a"), Some(vec2(160.0, 130.0)));
    }

    struct Scripted(Vec<PointerEvent>);

    impl PointerEventSource for Scripted {
        fn drain_events(&mut self) -> Vec<PointerEvent> {
            std::mem::take(&mut self.0)
        }
    }

    #[test]
    fn pump_drains_source_in_order() {
        let (mut engine, nodes) = setup();
        let mut controller = InteractionController::default();
        let mut source = Scripted(vec![
            PointerEvent::Down(vec2(100.0, 100.0)),
            PointerEvent::Move(vec2(180.0, 100.0)),
            PointerEvent::Up(vec2(180.0, 100.0)),
            PointerEvent::Down(vec2(400.0, 300.0)),
            PointerEvent::Up(vec2(400.0, 300.0)),
        ]);

        let events = controller.pump(&mut source, &mut engine, &nodes);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], InteractionEvent::DragStarted(_)));
        assert!(matches!(events[1], InteractionEvent::DragEnded { .. }));
        assert_eq!(events[2], InteractionEvent::Selected(nodes[1].clone()));
        assert!(source.drain_events().is_empty());
    }
}
