use cognisync_graph::calibration::{CalibrationState, DraftWarning, NodeCalibration};
use cognisync_graph::interaction::InteractionController;
use eframe::egui::{self, Color32, RichText, Ui};

use super::super::Workspace;
use super::super::render_utils::{FLAG_COLOR, band_color};

/// Sidebar for the selected node. Returns `true` when the user closed it.
pub(in crate::app) fn draw_node_details(
    ui: &mut Ui,
    controller: &InteractionController,
    form: &mut NodeCalibration,
    workspace: &mut Workspace,
) -> bool {
    // Looked up fresh so a calibration shows up immediately.
    let Some(node) = controller.selected_node(&workspace.nodes).cloned() else {
        ui.label("Select a concept in the graph.");
        return false;
    };

    let mut closed = false;
    ui.horizontal(|ui| {
        ui.heading(node.name.as_str());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Close").clicked() {
                closed = true;
            }
        });
    });
    ui.small(format!("id {}", node.id));
    ui.add_space(6.0);

    let band = node.band();
    ui.label(format!("Mastery: {}% ({})", node.mastery, band.label()));
    ui.add(
        egui::ProgressBar::new(f32::from(node.mastery) / 100.0)
            .fill(band_color(band))
            .desired_width(ui.available_width()),
    );
    ui.label(format!("Frequency: {}", node.frequency));

    if node.is_flagged {
        ui.add_space(4.0);
        ui.label(RichText::new("Flagged: calibrated by you, awaiting review").color(FLAG_COLOR));
    }

    ui.separator();
    ui.label(RichText::new("Definition").strong());
    if node.description.is_empty() {
        ui.label(RichText::new("No description yet.").italics());
    } else {
        ui.label(node.description.as_str());
    }
    ui.separator();

    match form.state() {
        CalibrationState::Idle => {
            if ui.button("Disagree").clicked() {
                form.begin(&node);
            }
        }
        CalibrationState::Editing => draw_node_form(ui, form, workspace),
        CalibrationState::Submitted => {
            ui.label(RichText::new("Calibration recorded.").color(Color32::from_rgb(34, 197, 94)));
            if ui.button("OK").clicked() {
                form.acknowledge();
            }
        }
    }

    closed
}

fn draw_node_form(ui: &mut Ui, form: &mut NodeCalibration, workspace: &mut Workspace) {
    let Some(draft) = form.draft().cloned() else {
        return;
    };

    ui.label(RichText::new("Your assessment").strong());
    let mut user_value = draft.user_value;
    ui.add(egui::Slider::new(&mut user_value, 0..=100).suffix("%"));
    if user_value != draft.user_value {
        form.set_user_value(user_value);
    }
    ui.label(format!(
        "Model says {}%, disagreement {:.0}",
        draft.model_value,
        draft.disagreement_index()
    ));

    let mut reason = draft.reason.clone();
    ui.add(
        egui::TextEdit::multiline(&mut reason)
            .hint_text("Why do you disagree?")
            .desired_rows(3),
    );
    if reason != draft.reason {
        form.set_reason(reason);
    }

    for warning in draft.warnings() {
        let text = match warning {
            DraftWarning::EmptyReason => "No reason given.",
            DraftWarning::ValueUnchanged => "Value matches the model's assessment.",
        };
        ui.small(text);
    }

    ui.horizontal(|ui| {
        if ui.button("Submit").clicked() {
            form.submit(workspace);
        }
        if ui.button("Cancel").clicked() {
            form.cancel();
        }
    });
}
