use cognisync_graph::MasteryBand;
use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const FLAG_COLOR: Color32 = Color32::from_rgb(239, 68, 68);

pub(super) fn band_color(band: MasteryBand) -> Color32 {
    match band {
        MasteryBand::Weak => Color32::from_rgb(239, 68, 68),
        MasteryBand::Developing => Color32::from_rgb(234, 179, 8),
        MasteryBand::Mastered => Color32::from_rgb(34, 197, 94),
    }
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(15, 23, 42));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(51, 65, 85, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2) -> bool {
    let min_x = start.x.min(end.x);
    let max_x = start.x.max(end.x);
    let min_y = start.y.min(end.y);
    let max_y = start.y.max(end.y);
    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

/// Maps layout coordinates to the screen. `focus` lands on the rect center
/// when there is no pan.
#[derive(Clone, Copy, Debug)]
pub(super) struct ViewTransform {
    pub rect: Rect,
    pub pan: Vec2,
    pub zoom: f32,
    pub focus: Vec2,
}

impl ViewTransform {
    pub(super) fn to_screen(self, world: Vec2) -> Pos2 {
        self.rect.center() + self.pan + (world - self.focus) * self.zoom
    }

    pub(super) fn to_world(self, screen: Pos2) -> Vec2 {
        (screen - self.rect.center() - self.pan) / self.zoom + self.focus
    }

    pub(super) fn scale(self, length: f32) -> f32 {
        length * self.zoom
    }
}
