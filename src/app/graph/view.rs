use cognisync_graph::interaction::InteractionEvent;
use cognisync_graph::render::{EdgeView, NodeView, RenderAdapter, paint_frame};
use eframe::egui::{self, Align2, Color32, FontId, Painter, Sense, Stroke, Ui, Vec2, vec2};

use super::super::Workspace;
use super::super::render_utils::{
    FLAG_COLOR, SELECTED_COLOR, ViewTransform, band_color, circle_visible, draw_background,
    edge_visible, with_opacity,
};
use super::GraphView;

/// Draws engine frames with the egui painter.
struct EguiPainter<'a> {
    painter: &'a Painter,
    transform: ViewTransform,
    hovered: Option<&'a str>,
}

impl RenderAdapter for EguiPainter<'_> {
    fn begin_frame(&mut self, _viewport: Vec2) {
        let transform = self.transform;
        draw_background(self.painter, transform.rect, transform.pan, transform.zoom);
    }

    fn edge(&mut self, edge: EdgeView) {
        let start = self.transform.to_screen(edge.from);
        let end = self.transform.to_screen(edge.to);
        if !edge_visible(self.transform.rect, start, end) {
            return;
        }
        let width = (1.5 * self.transform.zoom.sqrt()).clamp(0.6, 3.4);
        let color = with_opacity(Color32::from_rgb(71, 85, 105), edge.opacity * 0.8);
        self.painter.line_segment([start, end], Stroke::new(width, color));
    }

    fn node(&mut self, node: NodeView<'_>) {
        let position = self.transform.to_screen(node.position);
        let radius = self.transform.scale(node.radius);
        if !circle_visible(self.transform.rect, position, radius + 4.0) {
            return;
        }

        let hovered = self.hovered == Some(node.id);
        let fill = with_opacity(band_color(node.band), node.opacity);
        self.painter.circle_filled(position, radius, fill);

        let outline = if node.selected {
            Stroke::new(3.0, SELECTED_COLOR)
        } else if node.flagged {
            Stroke::new(2.0, with_opacity(FLAG_COLOR, node.opacity))
        } else if hovered {
            Stroke::new(2.0, Color32::WHITE)
        } else {
            Stroke::new(1.5, with_opacity(Color32::from_rgb(30, 41, 59), node.opacity))
        };
        self.painter.circle_stroke(position, radius, outline);

        if node.flagged {
            let marker = position + vec2(radius * 0.7, -radius * 0.7);
            self.painter
                .circle_filled(marker, 4.0, with_opacity(FLAG_COLOR, node.opacity));
        }
        if node.pinned {
            self.painter
                .circle_stroke(position, radius + 4.0, Stroke::new(1.0, SELECTED_COLOR));
        }

        self.painter.text(
            position + vec2(0.0, radius + 8.0),
            Align2::CENTER_TOP,
            node.name,
            FontId::proportional(12.0),
            with_opacity(Color32::from_gray(226), node.opacity),
        );
    }
}

impl GraphView {
    pub(super) fn draw_graph(&mut self, ui: &mut Ui, workspace: &Workspace) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.engine.resize(rect.size());
        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let transform = self.transform(rect);
        self.pointer.collect(ui, transform);
        for event in self
            .controller
            .pump(&mut self.pointer, &mut self.engine, &workspace.nodes)
        {
            match event {
                InteractionEvent::Selected(node) => {
                    tracing::debug!(id = %node.id, mastery = node.mastery, "node selected");
                    self.node_form.cancel();
                }
                InteractionEvent::DragStarted(id) => {
                    tracing::trace!(%id, "drag started");
                }
                InteractionEvent::DragEnded { id, position } => {
                    tracing::trace!(%id, x = position.x, y = position.y, "drag ended");
                }
            }
        }

        if self.engine.step_frame() || self.controller.is_dragging() {
            ui.ctx().request_repaint();
        }

        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| self.engine.node_at(transform.to_world(pointer)))
            .map(|entry| entry.id().to_owned());
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let mut adapter = EguiPainter {
            painter: &painter,
            transform,
            hovered: hovered.as_deref(),
        };
        paint_frame(
            &self.engine,
            &self.search,
            self.controller.selected_id(),
            &mut adapter,
        );

        if workspace.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No concepts in the graph yet.",
                FontId::proportional(14.0),
                Color32::from_gray(200),
            );
        }
    }
}
