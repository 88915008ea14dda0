use std::path::Path;

use cognisync_graph::calibration::{
    AlignmentBand, CalibrationKind, CalibrationState, CalibrationValue, Dimension, EvidenceLog,
    ProfileCalibration,
};
use cognisync_graph::MasteryBand;
use eframe::egui::{self, Color32, RichText, Ui};

use super::super::Workspace;
use super::super::render_utils::{FLAG_COLOR, band_color};

pub(in crate::app) fn draw_legend(ui: &mut Ui) {
    for (band, range) in [
        (MasteryBand::Weak, "< 50"),
        (MasteryBand::Developing, "50-79"),
        (MasteryBand::Mastered, "80+"),
    ] {
        ui.label(RichText::new("●").color(band_color(band)));
        ui.label(format!("{} {range}", band.label()));
    }
    ui.label(RichText::new("○").color(FLAG_COLOR));
    ui.label("Flagged");
}

pub(in crate::app) fn draw_profile_calibration(
    ui: &mut Ui,
    form: &mut ProfileCalibration,
    workspace: &mut Workspace,
) {
    if form.model() != &workspace.profile {
        form.rebase(workspace.profile.clone());
    }

    ui.heading("Profile calibration");
    ui.label("Compare the model's view of you with your own.");
    ui.add_space(8.0);

    egui::Grid::new("profile_dimensions")
        .num_columns(3)
        .spacing([16.0, 8.0])
        .show(ui, |ui| {
            ui.label(RichText::new("Dimension").strong());
            ui.label(RichText::new("Model").strong());
            ui.label(RichText::new("You").strong());
            ui.end_row();

            for dimension in Dimension::ALL {
                ui.label(dimension.label());
                ui.label(format!("{:.0}", form.model().get(dimension)));
                let mut value = form.self_assessed().get(dimension);
                if ui.add(egui::Slider::new(&mut value, 0.0..=100.0).step_by(1.0)).changed() {
                    form.set_dimension(dimension, value);
                }
                ui.end_row();
            }
        });

    ui.add_space(8.0);
    let delta = form.total_delta();
    let (text, color) = match form.alignment() {
        AlignmentBand::HighAlignment => ("High alignment", Color32::from_rgb(34, 197, 94)),
        AlignmentBand::DivergenceDetected if form.is_severe() => ("Divergence detected", FLAG_COLOR),
        AlignmentBand::DivergenceDetected => {
            ("Divergence detected", Color32::from_rgb(234, 179, 8))
        }
    };
    ui.label(RichText::new(format!("Total delta {delta:.0}: {text}")).color(color));

    ui.add_space(8.0);
    ui.label("How much do you trust the model's assessment?");
    ui.horizontal(|ui| {
        let current = form.likert_trust();
        for score in 1..=5u8 {
            if ui.selectable_label(current == score, score.to_string()).clicked() {
                form.set_likert_trust(score);
            }
        }
    });

    let mut reason = form.reason().to_owned();
    ui.add(
        egui::TextEdit::multiline(&mut reason)
            .hint_text("Anything the model is missing?")
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );
    if reason != form.reason() {
        form.set_reason(reason);
    }

    ui.add_space(6.0);
    match form.state() {
        CalibrationState::Submitted => {
            ui.label(RichText::new("Calibration recorded.").color(Color32::from_rgb(34, 197, 94)));
            if ui.button("Calibrate again").clicked() {
                form.acknowledge();
            }
        }
        CalibrationState::Idle | CalibrationState::Editing => {
            if ui.button("Submit calibration").clicked() {
                form.submit(workspace);
            }
        }
    }
}

pub(in crate::app) fn draw_evidence(
    ui: &mut Ui,
    evidence: &EvidenceLog,
    export_path: &Path,
    status: &mut Option<String>,
) {
    ui.horizontal(|ui| {
        ui.heading("Evidence");
        ui.label(format!("{} entries", evidence.len()));
        if ui.button("Export JSON").clicked() {
            *status = Some(match evidence.export_to(export_path) {
                Ok(()) => format!("Exported to {}", export_path.display()),
                Err(error) => {
                    tracing::error!(%error, "evidence export failed");
                    format!("Export failed: {error}")
                }
            });
        }
    });
    if let Some(status) = status.as_deref() {
        ui.small(status);
    }
    ui.separator();

    if evidence.is_empty() {
        ui.label("No calibrations recorded yet.");
        return;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for log in evidence.entries() {
                let entry = &log.entry;
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        let kind = match entry.kind {
                            CalibrationKind::Profile => "Profile",
                            CalibrationKind::Node => "Node",
                        };
                        ui.label(RichText::new(kind).strong());
                        if let Some(target) = &entry.target_id {
                            ui.label(format!("node {target}"));
                        }
                        ui.label(log.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string());
                        ui.small(log.id.as_str());
                    });
                    ui.label(format!(
                        "model {} / user {}  |  disagreement {:.0}",
                        value_summary(&entry.model_value),
                        value_summary(&entry.user_value),
                        entry.disagreement_index
                    ));
                    if let Some(trust) = entry.likert_trust {
                        ui.label(format!("trust {trust}/5"));
                    }
                    if !entry.reason.is_empty() {
                        ui.label(RichText::new(entry.reason.as_str()).italics());
                    }
                });
            }
        });
}

fn value_summary(value: &CalibrationValue) -> String {
    match value {
        CalibrationValue::Score(score) => format!("{score:.0}"),
        CalibrationValue::Profile(profile) => format!(
            "{:.0}/{:.0}/{:.0}",
            profile.cognition, profile.affect, profile.behavior
        ),
    }
}
