//! Paint contract between the layout engine and whatever draws it.
//!
//! [`paint_frame`] reads the engine's live coordinates and hands one view per
//! edge and node to a [`RenderAdapter`]. Search only changes opacity, so
//! painting never touches layout state.

use eframe::egui::Vec2;

use crate::highlight;
use crate::layout::LayoutEngine;
use crate::model::MasteryBand;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeView {
    pub from: Vec2,
    pub to: Vec2,
    /// The dimmer of the two endpoint opacities.
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeView<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub position: Vec2,
    pub radius: f32,
    pub band: MasteryBand,
    pub opacity: f32,
    pub selected: bool,
    pub flagged: bool,
    pub pinned: bool,
}

pub trait RenderAdapter {
    fn begin_frame(&mut self, _viewport: Vec2) {}

    fn edge(&mut self, edge: EdgeView);

    fn node(&mut self, node: NodeView<'_>);

    fn end_frame(&mut self) {}
}

/// Paints edges first, then nodes in engine order.
pub fn paint_frame(
    engine: &LayoutEngine,
    search_term: &str,
    selected_id: Option<&str>,
    adapter: &mut impl RenderAdapter,
) {
    let nodes = engine.nodes();
    let opacities = highlight::opacities(nodes.iter().map(|entry| &entry.node), search_term);

    adapter.begin_frame(engine.viewport());

    for link in engine.links() {
        let (Some(source), Some(target)) = (nodes.get(link.source), nodes.get(link.target)) else {
            continue;
        };
        adapter.edge(EdgeView {
            from: source.position,
            to: target.position,
            opacity: opacities[link.source].min(opacities[link.target]),
        });
    }

    for (entry, opacity) in nodes.iter().zip(opacities) {
        adapter.node(NodeView {
            id: entry.id(),
            name: &entry.node.name,
            position: entry.position,
            radius: entry.radius,
            band: entry.node.band(),
            opacity,
            selected: selected_id == Some(entry.id()),
            flagged: entry.node.is_flagged,
            pinned: entry.is_pinned(),
        });
    }

    adapter.end_frame();
}
