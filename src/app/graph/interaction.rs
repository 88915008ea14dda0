use cognisync_graph::interaction::{PointerEvent, PointerEventSource};
use eframe::egui::{self, Rect, Ui};

use super::super::render_utils::ViewTransform;
use super::GraphView;

/// Collects primary-button gestures from egui input, in layout coordinates.
///
/// A gesture only starts on a press inside the graph rect; moves outside a
/// gesture are ignored.
#[derive(Default)]
pub(super) struct EguiPointerSource {
    pressed: bool,
    pending: Vec<PointerEvent>,
}

impl EguiPointerSource {
    pub(super) fn collect(&mut self, ui: &Ui, transform: ViewTransform) {
        let events = ui.input(|input| input.events.clone());
        for event in events {
            match event {
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: true,
                    ..
                } if transform.rect.contains(pos) => {
                    self.pressed = true;
                    self.pending.push(PointerEvent::Down(transform.to_world(pos)));
                }
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: false,
                    ..
                } if self.pressed => {
                    self.pressed = false;
                    self.pending.push(PointerEvent::Up(transform.to_world(pos)));
                }
                egui::Event::PointerMoved(pos) if self.pressed => {
                    self.pending.push(PointerEvent::Move(transform.to_world(pos)));
                }
                egui::Event::PointerGone | egui::Event::WindowFocused(false) if self.pressed => {
                    self.pressed = false;
                    self.pending.push(PointerEvent::Cancel);
                }
                _ => {}
            }
        }
    }
}

impl PointerEventSource for EguiPointerSource {
    fn drain_events(&mut self) -> Vec<PointerEvent> {
        std::mem::take(&mut self.pending)
    }
}

impl GraphView {
    pub(super) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let before = self.transform(rect).to_world(pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.2, 4.0);
        let drift = self.transform(rect).to_screen(before) - pointer;
        self.pan -= drift;
    }

    pub(super) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    pub(super) fn transform(&self, rect: Rect) -> ViewTransform {
        ViewTransform {
            rect,
            pan: self.pan,
            zoom: self.zoom,
            focus: self.engine.center(),
        }
    }
}
