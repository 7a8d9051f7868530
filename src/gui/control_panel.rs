//! Control Panel Widget
//! Left side panel with the data source, province filter and export actions.

use egui::{Color32, RichText, ScrollArea};
use std::path::PathBuf;

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub provinces: Vec<String>,
    pub selected: Vec<bool>,
    pub status: String,
    pub busy: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            csv_path: None,
            provinces: Vec::new(),
            selected: Vec::new(),
            status: "Ready".to_string(),
            busy: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the province options; `initial` lists the ones to tick.
    pub fn update_provinces(&mut self, provinces: Vec<String>, initial: &[String]) {
        self.selected = provinces.iter().map(|p| initial.contains(p)).collect();
        self.provinces = provinces;
    }

    /// Currently ticked provinces, in option order.
    pub fn selected_provinces(&self) -> Vec<String> {
        self.provinces
            .iter()
            .zip(self.selected.iter())
            .filter(|(_, &selected)| selected)
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Teacher Distribution")
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Community Schools (2074 BS)")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.csv_path.is_some() {
                            ui.visuals().text_color()
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.busy, |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = ControlPanelAction::BrowseCsv;
                            }
                        });
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Province Filter =====
        ui.label(RichText::new("🔍 Filter").size(14.0).strong());
        ui.label("Select Province(s):");
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                    for (i, province) in self.provinces.iter().enumerate() {
                        if i < self.selected.len()
                            && ui
                                .checkbox(&mut self.selected[i], format!("Province {}", province))
                                .changed()
                        {
                            action = ControlPanelAction::SelectionChanged;
                        }
                    }
                });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.selected.iter_mut().for_each(|v| *v = true);
                action = ControlPanelAction::SelectionChanged;
            }
            if ui.small_button("Clear All").clicked() {
                self.selected.iter_mut().for_each(|v| *v = false);
                action = ControlPanelAction::SelectionChanged;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export =====
        let export_enabled = !self.busy && !self.provinces.is_empty();
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(export_enabled, |ui| {
                let charts = egui::Button::new(RichText::new("🖼 Export Charts").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(charts).clicked() {
                    action = ControlPanelAction::ExportCharts;
                }

                ui.add_space(6.0);

                let json = egui::Button::new(RichText::new("📄 Export JSON").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(json).clicked() {
                    action = ControlPanelAction::ExportJson;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status =====
        if self.busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new(&self.status).size(11.0));
            });
        } else {
            let status_color = if self.status.contains("Error") {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        }

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    SelectionChanged,
    ExportCharts,
    ExportJson,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provinces() -> Vec<String> {
        ["1", "2", "3"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_update_provinces_ticks_initial_selection() {
        let mut panel = ControlPanel::new();
        panel.update_provinces(provinces(), &["3".to_string(), "1".to_string()]);

        assert_eq!(panel.selected, vec![true, false, true]);
        assert_eq!(panel.selected_provinces(), vec!["1", "3"]);
    }

    #[test]
    fn test_update_provinces_resets_previous_state() {
        let mut panel = ControlPanel::new();
        panel.update_provinces(provinces(), &provinces());
        panel.update_provinces(vec!["7".to_string()], &[]);

        assert_eq!(panel.selected, vec![false]);
        assert!(panel.selected_provinces().is_empty());
    }
}
