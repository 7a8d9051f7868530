//! Chart Viewer Widget
//! Central scrollable dashboard: metric rows, charts and the raw data table.

use crate::charts::plotter::{DEEP_BLUE, DEEP_RED};
use crate::charts::{ChartData, ChartPlotter};
use egui::{RichText, ScrollArea};

const SECTION_SPACING: f32 = 18.0;

/// Scrollable dashboard for the current province selection.
#[derive(Default)]
pub struct ChartViewer {
    pub chart_data: Option<ChartData>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.chart_data = None;
    }

    pub fn set_chart_data(&mut self, chart_data: ChartData) {
        self.chart_data = Some(chart_data);
    }

    /// Draw the dashboard
    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(data) = &self.chart_data else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("📊 Teacher Distribution in Community Schools (2074 BS)");
                ui.label(
                    "Approved and relief (Rahat) teacher positions across community schools. \
                     Use the filters on the left to explore data by province.",
                );
                ui.add_space(SECTION_SPACING);

                ChartPlotter::draw_metrics(ui, &data.metrics);

                if data.is_empty() {
                    ui.add_space(SECTION_SPACING);
                    ui.label(RichText::new("No provinces selected").size(16.0));
                    return;
                }

                Self::section(ui, "Distribution of Total Approved Teachers by District");
                ChartPlotter::draw_histogram(ui, data);

                ui.columns(2, |cols| {
                    Self::section(&mut cols[0], "Top 10 Districts by Number of Approved Teachers");
                    ChartPlotter::draw_ranking(&mut cols[0], "top_districts", &data.top, DEEP_BLUE);

                    Self::section(
                        &mut cols[1],
                        "Bottom 10 Districts by Number of Approved Teachers",
                    );
                    ChartPlotter::draw_ranking(
                        &mut cols[1],
                        "bottom_districts",
                        &data.bottom,
                        DEEP_RED,
                    );
                });

                Self::section(ui, "Boxplot of Total Approved Teachers");
                ChartPlotter::draw_boxplot(ui, data);
                ChartPlotter::draw_stats_table(ui, &data.approved_stats);

                Self::section(ui, "Share of Approved Teachers by Province");
                ChartPlotter::draw_pie(ui, data);

                Self::section(ui, "Approved vs. Relief Teachers by District");
                ChartPlotter::draw_comparison(ui, data);

                if data.cluster_count() > 0 {
                    Self::section(ui, "K-Means Groups of Districts");
                    ChartPlotter::draw_cluster_scatter(ui, data);
                }

                ui.add_space(SECTION_SPACING);
                egui::CollapsingHeader::new("Show Raw Data")
                    .default_open(false)
                    .show(ui, |ui| {
                        ChartPlotter::draw_raw_table(ui, &data.rows);
                    });
            });
    }

    fn section(ui: &mut egui::Ui, title: &str) {
        ui.add_space(SECTION_SPACING);
        ui.label(RichText::new(title).size(16.0).strong());
        ui.add_space(6.0);
    }
}
