use cognisync_graph::calibration::NodeCalibration;
use cognisync_graph::interaction::InteractionController;
use cognisync_graph::{LayoutConfig, LayoutEngine, PositionStore};
use eframe::egui::{self, Context, Vec2};

use self::interaction::EguiPointerSource;
use super::Workspace;

mod interaction;
mod view;

const DETAILS_WIDTH: f32 = 340.0;

/// The mounted Knowledge Graph tab.
///
/// Owns the layout engine for as long as the tab is visible. Unmounting
/// stops the engine and returns its position memory to the host.
pub(super) struct GraphView {
    engine: LayoutEngine,
    controller: InteractionController,
    pointer: EguiPointerSource,
    node_form: NodeCalibration,
    search: String,
    pan: Vec2,
    zoom: f32,
    synced_revision: Option<u64>,
}

impl GraphView {
    pub(super) fn mount(config: LayoutConfig, store: PositionStore, workspace: &Workspace) -> Self {
        let mut view = Self {
            engine: LayoutEngine::new(config, store),
            controller: InteractionController::default(),
            pointer: EguiPointerSource::default(),
            node_form: NodeCalibration::new(),
            search: String::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            synced_revision: None,
        };
        view.sync(workspace);
        view
    }

    pub(super) fn unmount(self) -> PositionStore {
        self.engine.into_store()
    }

    fn sync(&mut self, workspace: &Workspace) {
        if self.synced_revision == Some(workspace.revision) {
            return;
        }
        let outcome = self.engine.sync(&workspace.nodes, &workspace.edges);
        tracing::debug!(revision = workspace.revision, ?outcome, "graph view synced");
        self.synced_revision = Some(workspace.revision);
    }

    pub(super) fn show(&mut self, ctx: &Context, workspace: &mut Workspace) {
        self.sync(workspace);

        egui::TopBottomPanel::top("graph_toolbar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Search");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.search)
                            .hint_text("Filter concepts by name")
                            .desired_width(220.0),
                    );
                    if ui.button("Reset view").clicked() {
                        self.pan = Vec2::ZERO;
                        self.zoom = 1.0;
                    }
                    ui.separator();
                    super::ui::draw_legend(ui);
                });
            });

        // Always present: a panel appearing on selection would resize the
        // graph surface and move the nodes.
        egui::SidePanel::right("node_details")
            .resizable(false)
            .exact_width(DETAILS_WIDTH)
            .show(ctx, |ui| {
                let closed = super::ui::draw_node_details(
                    ui,
                    &self.controller,
                    &mut self.node_form,
                    workspace,
                );
                if closed {
                    self.controller.clear_selection();
                    self.node_form.cancel();
                }
            });

        // A submitted calibration changes node data; pick it up this frame.
        self.sync(workspace);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui, workspace));
    }
}

#[cfg(test)]
mod tests {
    use cognisync_graph::GraphSnapshot;
    use cognisync_graph::interaction::PointerEvent;
    use eframe::egui::{Pos2, RawInput, Rect, vec2};

    use super::*;

    fn frame(ctx: &Context, view: &mut GraphView, workspace: &mut Workspace) {
        let input = RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, vec2(1100.0, 800.0))),
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| view.show(ctx, workspace));
    }

    #[test]
    fn selecting_a_node_keeps_the_viewport() {
        let ctx = Context::default();
        let mut workspace = Workspace::from_snapshot(GraphSnapshot::sample());
        let mut view = GraphView::mount(LayoutConfig::default(), PositionStore::new(), &workspace);

        for _ in 0..3 {
            frame(&ctx, &mut view, &mut workspace);
        }
        let viewport = view.engine.viewport();
        view.engine.stop();

        let point = view.engine.position("3").expect("node 3 laid out");
        view.controller
            .handle(PointerEvent::Down(point), &mut view.engine, &workspace.nodes);
        view.controller
            .handle(PointerEvent::Up(point), &mut view.engine, &workspace.nodes);
        assert_eq!(view.controller.selected_id(), Some("3"));

        frame(&ctx, &mut view, &mut workspace);
        assert_eq!(view.engine.viewport(), viewport);
        assert!(!view.engine.is_running());
        assert_eq!(view.engine.position("3"), Some(point));
    }
}
