//! Drawing of the upload form, preview, result card and status bar.

use super::{Action, LeafApp, ServiceHealth};
use eframe::egui;
use leaf_core::{Health, NoticeKind, ResultCard, ViewModel};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(76, 175, 80);
const DISEASE: egui::Color32 = egui::Color32::from_rgb(229, 115, 55);
const PREVIEW_BOX: f32 = 320.0;

pub(crate) fn health_color(health: Health) -> egui::Color32 {
    match health {
        Health::Healthy => ACCENT,
        Health::Diseased => DISEASE,
    }
}

pub(crate) fn health_title(health: Health) -> &'static str {
    match health {
        Health::Healthy => "Healthy leaf",
        Health::Diseased => "Disease detected",
    }
}

impl LeafApp {
    /// Renders the main form. Returns the action the user triggered, if any.
    pub(super) fn render_main(&self, ui: &mut egui::Ui, view: &ViewModel) -> Option<Action> {
        let mut action = None;
        ui.vertical_centered(|ui| {
            ui.heading("Predict Potato Leaf Disease");
            ui.label("Upload an image of a potato leaf to predict its health status.");
        });
        ui.add_space(12.0);

        if view.show_upload {
            action = action.or(self.render_drop_zone(ui, view));
        } else {
            action = action.or(self.render_preview(ui, view));
        }

        if let Some(notice) = &view.notice {
            ui.add_space(8.0);
            let color = match notice.kind {
                NoticeKind::Validation => ui.visuals().warn_fg_color,
                NoticeKind::Failure => ui.visuals().error_fg_color,
            };
            ui.vertical_centered(|ui| {
                ui.colored_label(color, &notice.message);
            });
        }

        if let Some(card) = &view.result {
            ui.add_space(12.0);
            render_result(ui, card);
        }
        action
    }

    fn render_drop_zone(&self, ui: &mut egui::Ui, view: &ViewModel) -> Option<Action> {
        let mut action = None;
        let stroke_color = if view.drag_hover {
            ACCENT
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke.color
        };
        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(2.0, stroke_color))
            .inner_margin(egui::Margin::same(24))
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    let hint = if view.drag_hover {
                        "Release to use this image"
                    } else {
                        "Drag and drop a leaf image here"
                    };
                    ui.label(egui::RichText::new(hint).size(16.0));
                    ui.add_space(6.0);
                    ui.label("or");
                    ui.add_space(6.0);
                    if ui.button("Choose a file").clicked() {
                        action = Some(Action::PickFile);
                    }
                    ui.add_space(4.0);
                    if ui.button("Predict Disease").clicked() {
                        action = Some(Action::Submit);
                    }
                });
            });
        action
    }

    fn render_preview(&self, ui: &mut egui::Ui, view: &ViewModel) -> Option<Action> {
        let mut action = None;
        ui.vertical_centered(|ui| {
            let texture = view
                .preview
                .and_then(|id| self.controller.previews().texture(id));
            match texture {
                Some(tex) => {
                    ui.add(
                        egui::Image::new((tex.id(), tex.size_vec2()))
                            .max_size(egui::vec2(PREVIEW_BOX, PREVIEW_BOX)),
                    );
                }
                None => {
                    let desired = egui::vec2(PREVIEW_BOX, PREVIEW_BOX * 0.6);
                    let (resp, painter) = ui.allocate_painter(desired, egui::Sense::hover());
                    painter.rect_filled(resp.rect, 4.0, egui::Color32::from_gray(40));
                    painter.text(
                        resp.rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "No preview available",
                        egui::FontId::proportional(14.0),
                        egui::Color32::LIGHT_GRAY,
                    );
                }
            }
            if let Some(name) = &view.file_name {
                ui.small(name);
            }
            ui.add_space(8.0);

            if view.show_progress {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Analyzing leaf...");
                });
            } else if view.awaiting_previous {
                ui.weak("Waiting for the previous request to finish...");
            }
            ui.horizontal(|ui| {
                if view.can_submit && ui.button("Predict Disease").clicked() {
                    action = Some(Action::Submit);
                }
                if view.can_choose_different && ui.button("Choose different image").clicked() {
                    action = Some(Action::ClearImage);
                }
            });
        });
        action
    }

    pub(super) fn render_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let (color, text) = match &self.service {
                ServiceHealth::Checking => (ui.visuals().weak_text_color(), "checking...".to_string()),
                ServiceHealth::Reachable => (ACCENT, "online".to_string()),
                ServiceHealth::Unreachable(reason) => {
                    (ui.visuals().error_fg_color, format!("unreachable ({reason})"))
                }
            };
            ui.label(format!("Service {}:", self.client.config().endpoint));
            ui.colored_label(color, text);
            if !self.status.is_empty() {
                ui.separator();
                ui.label(&self.status);
            }
        });
    }
}

fn render_result(ui: &mut egui::Ui, card: &ResultCard) {
    let color = health_color(card.health);
    egui::Frame::group(ui.style())
        .stroke(egui::Stroke::new(2.0, color))
        .inner_margin(egui::Margin::same(16))
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.heading("Prediction Result");
                ui.label(
                    egui::RichText::new(health_title(card.health))
                        .color(color)
                        .strong(),
                );
                ui.add_space(6.0);
                ui.label(format!("Predicted Class: {}", card.label));
                ui.label(format!("Confidence: {}", card.confidence));
            });
        });
}
