use std::path::PathBuf;

use cognisync_graph::calibration::{
    CalibrationEntry, CalibrationSink, EvidenceLog, ProfileCalibration, UserProfile,
};
use cognisync_graph::{Edge, GraphSnapshot, LayoutConfig, Node, NodeUpdate, PositionStore};
use eframe::egui::{self, Align, Context, Layout};

use self::graph::GraphView;

mod graph;
mod render_utils;
mod ui;

pub struct KnowledgeGraphApp {
    workspace: Workspace,
    tab: Tab,
    layout_config: LayoutConfig,
    graph_view: Option<GraphView>,
    parked_positions: PositionStore,
    profile_form: ProfileCalibration,
    export_path: PathBuf,
    status: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    KnowledgeGraph,
    Calibration,
    Evidence,
}

impl Tab {
    const ALL: [Self; 3] = [Self::KnowledgeGraph, Self::Calibration, Self::Evidence];

    fn label(self) -> &'static str {
        match self {
            Self::KnowledgeGraph => "Knowledge Graph",
            Self::Calibration => "Calibration",
            Self::Evidence => "Evidence",
        }
    }
}

/// Host-owned state: the upstream graph and the evidence log.
///
/// Calibrations flow back in through [`CalibrationSink`]; every node change
/// bumps `revision` so the graph view knows to resync.
struct Workspace {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    profile: UserProfile,
    evidence: EvidenceLog,
    revision: u64,
}

impl Workspace {
    fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        Self {
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            profile: snapshot.profile.unwrap_or_default(),
            evidence: EvidenceLog::with_entries(snapshot.logs),
            revision: 0,
        }
    }
}

impl CalibrationSink for Workspace {
    fn on_node_update(&mut self, id: &str, update: NodeUpdate) {
        let Some(node) = self.nodes.iter_mut().find(|node| node.id == id) else {
            tracing::warn!(id, "calibrated node is no longer in the graph");
            return;
        };
        update.apply_to(node);
        self.revision += 1;
    }

    fn on_log_calibration(&mut self, entry: CalibrationEntry) {
        self.evidence.append(entry);
    }
}

impl KnowledgeGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        snapshot: GraphSnapshot,
        layout_config: LayoutConfig,
        export_path: PathBuf,
    ) -> Self {
        let workspace = Workspace::from_snapshot(snapshot);
        let profile_form = ProfileCalibration::new(workspace.profile.clone());
        let graph_view = GraphView::mount(layout_config, PositionStore::new(), &workspace);

        Self {
            workspace,
            tab: Tab::KnowledgeGraph,
            layout_config,
            graph_view: Some(graph_view),
            parked_positions: PositionStore::new(),
            profile_form,
            export_path,
            status: None,
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }

        if let Some(view) = self.graph_view.take() {
            self.parked_positions = view.unmount();
        }
        if tab == Tab::KnowledgeGraph {
            let store = std::mem::take(&mut self.parked_positions);
            self.graph_view = Some(GraphView::mount(self.layout_config, store, &self.workspace));
        }
        tracing::debug!(from = self.tab.label(), to = tab.label(), "tab switched");
        self.tab = tab;
    }
}

impl eframe::App for KnowledgeGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut next_tab = self.tab;

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("CogniSync");
                    ui.separator();
                    for tab in Tab::ALL {
                        ui.selectable_value(&mut next_tab, tab, tab.label());
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!("logs: {}", self.workspace.evidence.len()));
                        ui.label(format!("edges: {}", self.workspace.edges.len()));
                        ui.label(format!("nodes: {}", self.workspace.nodes.len()));
                    });
                });
            });

        self.switch_tab(next_tab);

        match self.tab {
            Tab::KnowledgeGraph => {
                if let Some(view) = self.graph_view.as_mut() {
                    view.show(ctx, &mut self.workspace);
                }
            }
            Tab::Calibration => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui::draw_profile_calibration(ui, &mut self.profile_form, &mut self.workspace);
                });
            }
            Tab::Evidence => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui::draw_evidence(
                        ui,
                        &self.workspace.evidence,
                        &self.export_path,
                        &mut self.status,
                    );
                });
            }
        }
    }
}
