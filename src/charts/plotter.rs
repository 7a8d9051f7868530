//! Chart Plotter Module
//! Creates the interactive dashboard charts using egui_plot.

use crate::data::{DataProcessor, DistrictRecord, TeacherType, TeacherTypeCount, RANKING_SIZE};
use crate::stats::{
    format_thousands, BoxplotStats, DescriptiveStats, Histogram, StatsCalculator, SummaryMetrics,
    HISTOGRAM_BINS,
};
use egui::{Color32, RichText};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoint, PlotPoints, Points,
    Polygon, Text,
};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Histogram bars
pub const SKY_BLUE: Color32 = Color32::from_rgb(135, 206, 235);
/// Top-10 bars
pub const DEEP_BLUE: Color32 = Color32::from_rgb(49, 102, 160);
/// Bottom-10 bars
pub const DEEP_RED: Color32 = Color32::from_rgb(178, 34, 34);
/// Boxplot fill
pub const LIGHT_GREEN: Color32 = Color32::from_rgb(144, 238, 144);
/// Approved series in the comparison chart
pub const APPROVED_COLOR: Color32 = Color32::from_rgb(52, 152, 219);
/// Relief series in the comparison chart
pub const RELIEF_COLOR: Color32 = Color32::from_rgb(243, 156, 18);

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(161, 201, 244), // Pastel blue
    Color32::from_rgb(255, 180, 130), // Pastel orange
    Color32::from_rgb(141, 229, 161), // Pastel green
    Color32::from_rgb(255, 159, 155), // Pastel red
    Color32::from_rgb(208, 187, 255), // Pastel purple
    Color32::from_rgb(222, 187, 155), // Pastel brown
    Color32::from_rgb(250, 176, 228), // Pastel pink
    Color32::from_rgb(207, 207, 207), // Pastel grey
    Color32::from_rgb(255, 254, 163), // Pastel yellow
    Color32::from_rgb(185, 242, 240), // Pastel cyan
];

/// Number of segments used to approximate a full pie circle.
const PIE_SEGMENTS: usize = 180;

/// Sample points of the density overlay.
const KDE_POINTS: usize = 200;

/// One district on the cluster scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPoint {
    pub district: String,
    pub total_approved: f64,
    pub total_relief: f64,
    pub cluster: usize,
}

/// Everything the dashboard draws for one province selection.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub metrics: SummaryMetrics,
    pub approved_stats: DescriptiveStats,
    pub histogram: Option<Histogram>,
    pub kde: Vec<[f64; 2]>,
    pub top: Vec<DistrictRecord>,
    pub bottom: Vec<DistrictRecord>,
    pub boxplot: Option<BoxplotStats>,
    pub province_totals: Vec<(String, f64)>,
    pub province_shares: Vec<f64>,
    pub comparison: Vec<TeacherTypeCount>,
    pub clusters: Vec<ClusterPoint>,
    pub rows: Vec<DistrictRecord>,
}

impl ChartData {
    /// Derive every chart series from the filtered rows.
    pub fn build(rows: Vec<DistrictRecord>) -> Self {
        let approved: Vec<f64> = rows.iter().map(|r| r.total_approved).collect();

        let histogram = StatsCalculator::histogram(&approved, HISTOGRAM_BINS);
        let kde = histogram
            .as_ref()
            .map(|h| {
                let scale = approved.len() as f64 * h.bin_width;
                StatsCalculator::kde_curve(&approved, KDE_POINTS, scale)
            })
            .unwrap_or_default();

        let province_totals = DataProcessor::province_totals(&rows);
        let totals: Vec<f64> = province_totals.iter().map(|(_, t)| *t).collect();
        let province_shares = StatsCalculator::share_percentages(&totals);

        let clusters = rows
            .iter()
            .filter_map(|r| {
                r.cluster.map(|cluster| ClusterPoint {
                    district: r.district.clone(),
                    total_approved: r.total_approved,
                    total_relief: r.total_relief,
                    cluster,
                })
            })
            .collect();

        Self {
            metrics: SummaryMetrics::compute(&rows),
            approved_stats: StatsCalculator::compute_descriptive_stats(&approved),
            histogram,
            kde,
            top: DataProcessor::top_districts(&rows, RANKING_SIZE),
            bottom: DataProcessor::bottom_districts(&rows, RANKING_SIZE),
            boxplot: StatsCalculator::boxplot_stats(&approved),
            province_totals,
            province_shares,
            comparison: DataProcessor::stack_to_long(&rows),
            clusters,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Highest cluster label + 1.
    pub fn cluster_count(&self) -> usize {
        self.clusters
            .iter()
            .map(|p| p.cluster + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Outline of one pie slice, starting at the center.
pub fn pie_slice(start_angle: f64, sweep: f64, radius: f64) -> Vec<[f64; 2]> {
    let steps = ((sweep / TAU) * PIE_SEGMENTS as f64).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push([0.0, 0.0]);
    for i in 0..=steps {
        let angle = start_angle + sweep * i as f64 / steps as f64;
        points.push([radius * angle.cos(), radius * angle.sin()]);
    }
    points
}

/// Slice geometry `(start angle, sweep)` for percentage shares, beginning
/// at 12 o'clock and running counter-clockwise.
pub fn pie_angles(shares: &[f64]) -> Vec<(f64, f64)> {
    let mut angle = FRAC_PI_2;
    shares
        .iter()
        .map(|share| {
            let sweep = share / 100.0 * TAU;
            let slice = (angle, sweep);
            angle += sweep;
            slice
        })
        .collect()
}

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Colour for a cluster or province index.
    pub fn palette_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Draw the two rows of headline metrics.
    pub fn draw_metrics(ui: &mut egui::Ui, metrics: &SummaryMetrics) {
        let optional = |v: Option<f64>| v.map(format_thousands).unwrap_or_else(|| "-".to_string());

        let first = [
            ("Total Districts Selected", metrics.district_count.to_string()),
            ("Total Approved Teachers", format_thousands(metrics.total_approved)),
            ("Total Relief Teachers", format_thousands(metrics.total_relief)),
        ];
        let second = [
            ("Avg Approved Teachers per District", optional(metrics.avg_approved)),
            ("Max Approved Teachers in a District", optional(metrics.max_approved)),
            ("Min Approved Teachers in a District", optional(metrics.min_approved)),
        ];

        for row in [first, second] {
            ui.columns(3, |cols| {
                for (col, (label, value)) in cols.iter_mut().zip(row.iter()) {
                    col.label(RichText::new(*label).size(12.0).color(Color32::GRAY));
                    col.label(RichText::new(value).size(26.0).strong());
                }
            });
            ui.add_space(8.0);
        }
    }

    /// Histogram of total approved posts with the density overlay.
    pub fn draw_histogram(ui: &mut egui::Ui, data: &ChartData) {
        let Some(histogram) = &data.histogram else {
            return;
        };

        let bars: Vec<Bar> = histogram
            .counts
            .iter()
            .enumerate()
            .map(|(i, &count)| {
                Bar::new(histogram.bin_center(i), count as f64).width(histogram.bin_width * 0.95)
            })
            .collect();

        Plot::new("approved_histogram")
            .height(280.0)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Number of Approved Teachers")
            .y_axis_label("Number of Districts")
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(SKY_BLUE).name("Districts"));

                if !data.kde.is_empty() {
                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(data.kde.iter().copied()))
                            .color(DEEP_BLUE)
                            .width(2.0)
                            .name("Density"),
                    );
                }
            });
    }

    /// Horizontal bar ranking; the first row is drawn at the top.
    pub fn draw_ranking(ui: &mut egui::Ui, id: &str, rows: &[DistrictRecord], color: Color32) {
        let n = rows.len();
        let names: Vec<String> = rows.iter().map(|r| r.district.clone()).collect();

        let bars: Vec<Bar> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                Bar::new((n - 1 - i) as f64, r.total_approved)
                    .width(0.7)
                    .name(&r.district)
            })
            .collect();

        Plot::new(id)
            .height(280.0)
            .allow_scroll(false)
            .x_axis_label("Approved Teachers")
            .y_axis_formatter(move |mark, _range| Self::index_label(&names, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal().color(color));
            });
    }

    /// Single horizontal boxplot of total approved posts.
    pub fn draw_boxplot(ui: &mut egui::Ui, data: &ChartData) {
        let Some(b) = &data.boxplot else {
            return;
        };

        let elem = BoxElem::new(
            0.0,
            BoxSpread::new(b.whisker_low, b.q1, b.median, b.q3, b.whisker_high),
        )
        .box_width(0.5)
        .fill(LIGHT_GREEN.gamma_multiply(0.6))
        .stroke(egui::Stroke::new(1.5, Color32::DARK_GREEN));

        let outliers: PlotPoints = b.outliers.iter().map(|&v| [v, 0.0]).collect();

        Plot::new("approved_boxplot")
            .height(140.0)
            .allow_scroll(false)
            .show_axes([true, false])
            .x_axis_label("Total Approved Teachers")
            .show(ui, |plot_ui| {
                plot_ui.box_plot(BoxPlot::new(vec![elem]).horizontal().name("Approved"));
                plot_ui.points(
                    Points::new(outliers)
                        .radius(3.0)
                        .color(Color32::DARK_GRAY)
                        .name("Outliers"),
                );
            });
    }

    /// One-line table of descriptive statistics.
    pub fn draw_stats_table(ui: &mut egui::Ui, stats: &DescriptiveStats) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("approved_stats_table")
                    .striped(true)
                    .min_col_width(70.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        for header in [
                            "N", "Mean", "Median", "Std", "Variance", "Q1", "Q3", "Min", "Max",
                        ] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        ui.label(RichText::new(stats.count.to_string()).size(11.0));
                        for v in [
                            stats.mean,
                            stats.median,
                            stats.std,
                            stats.variance,
                            stats.q1,
                            stats.q3,
                            stats.min,
                            stats.max,
                        ] {
                            ui.label(RichText::new(format!("{:.1}", v)).size(11.0));
                        }
                        ui.end_row();
                    });
            });
    }

    /// Share of approved posts by province as a pie.
    pub fn draw_pie(ui: &mut egui::Ui, data: &ChartData) {
        let angles = pie_angles(&data.province_shares);

        Plot::new("province_pie")
            .height(360.0)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .legend(Legend::default())
            .include_x(-1.4)
            .include_x(1.4)
            .include_y(-1.4)
            .include_y(1.4)
            .show(ui, |plot_ui| {
                for (i, ((province, _), (start, sweep))) in
                    data.province_totals.iter().zip(angles.iter()).enumerate()
                {
                    let color = Self::palette_color(i);
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(pie_slice(*start, *sweep, 1.0)))
                            .fill_color(color)
                            .stroke(egui::Stroke::new(1.0, Color32::WHITE))
                            .name(format!("Province {}", province)),
                    );

                    let mid = start + sweep / 2.0;
                    plot_ui.text(Text::new(
                        PlotPoint::new(0.6 * mid.cos(), 0.6 * mid.sin()),
                        RichText::new(format!("{:.1}%", data.province_shares[i]))
                            .color(Color32::BLACK),
                    ));
                    plot_ui.text(Text::new(
                        PlotPoint::new(1.2 * mid.cos(), 1.2 * mid.sin()),
                        province.as_str(),
                    ));
                }
            });
    }

    /// Approved vs relief posts per district, grouped horizontal bars.
    pub fn draw_comparison(ui: &mut egui::Ui, data: &ChartData) {
        let mut names: Vec<String> = Vec::new();
        for row in &data.comparison {
            if names.last() != Some(&row.district) {
                names.push(row.district.clone());
            }
        }

        // Largest district on top: first name gets the highest slot
        let n = names.len();
        let mut approved: Vec<Bar> = Vec::new();
        let mut relief: Vec<Bar> = Vec::new();
        let mut idx = 0usize;
        for (i, row) in data.comparison.iter().enumerate() {
            if i > 0 && data.comparison[i - 1].district != row.district {
                idx += 1;
            }
            let slot = (n - 1 - idx) as f64;
            match row.teacher_type {
                TeacherType::Approved => approved
                    .push(Bar::new(slot + 0.2, row.count).width(0.4).name(&row.district)),
                TeacherType::Relief => relief
                    .push(Bar::new(slot - 0.2, row.count).width(0.4).name(&row.district)),
            }
        }
        names.reverse();

        let height = (names.len() as f32 * 22.0).clamp(240.0, 1400.0);

        Plot::new("approved_vs_relief")
            .height(height)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label("Number of Teachers")
            .y_axis_formatter(move |mark, _range| Self::index_label(&names, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new(approved)
                        .horizontal()
                        .color(APPROVED_COLOR)
                        .name(TeacherType::Approved.label()),
                );
                plot_ui.bar_chart(
                    BarChart::new(relief)
                        .horizontal()
                        .color(RELIEF_COLOR)
                        .name(TeacherType::Relief.label()),
                );
            });
    }

    /// Districts placed by approved vs relief totals, coloured by cluster.
    pub fn draw_cluster_scatter(ui: &mut egui::Ui, data: &ChartData) {
        let count = data.cluster_count();
        let hover_points = data.clusters.clone();

        Plot::new("cluster_scatter")
            .height(320.0)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label("Total Approved Teachers")
            .y_axis_label("Total Relief Teachers")
            .label_formatter(move |_name, value| {
                match nearest_cluster_point(&hover_points, value.x, value.y) {
                    Some(p) => format!(
                        "{}\nApproved: {}\nRelief: {}",
                        p.district,
                        format_thousands(p.total_approved),
                        format_thousands(p.total_relief)
                    ),
                    None => String::new(),
                }
            })
            .show(ui, |plot_ui| {
                for cluster in 0..count {
                    let points: PlotPoints = data
                        .clusters
                        .iter()
                        .filter(|p| p.cluster == cluster)
                        .map(|p| [p.total_approved, p.total_relief])
                        .collect();

                    plot_ui.points(
                        Points::new(points)
                            .radius(5.0)
                            .color(Self::palette_color(cluster).gamma_multiply(1.4))
                            .name(format!("Cluster {}", cluster)),
                    );
                }
            });
    }

    /// Raw rows of the current selection.
    pub fn draw_raw_table(ui: &mut egui::Ui, rows: &[DistrictRecord]) {
        egui::ScrollArea::both().max_height(320.0).show(ui, |ui| {
            egui::Grid::new("raw_data_table")
                .striped(true)
                .min_col_width(60.0)
                .spacing([10.0, 4.0])
                .show(ui, |ui| {
                    for header in [
                        "Province",
                        "District",
                        "Appr. Primary",
                        "Appr. Lower Sec.",
                        "Appr. Secondary",
                        "Relief Primary",
                        "Relief Lower Sec.",
                        "Relief Secondary",
                        "Total Approved",
                        "Total Relief",
                        "Cluster",
                    ] {
                        ui.label(RichText::new(header).strong().size(11.0));
                    }
                    ui.end_row();

                    for r in rows {
                        ui.label(&r.province);
                        ui.label(&r.district);
                        for v in [
                            r.approved_primary,
                            r.approved_lower_secondary,
                            r.approved_secondary,
                            r.relief_primary,
                            r.relief_lower_secondary,
                            r.relief_secondary,
                            r.total_approved,
                            r.total_relief,
                        ] {
                            ui.label(format!("{:.0}", v));
                        }
                        let cluster = r.cluster.map(|c| c.to_string());
                        ui.label(cluster.unwrap_or_else(|| "-".to_string()));
                        ui.end_row();
                    }
                });
        });
    }

    /// Label for an integer axis mark, empty between categories.
    fn index_label(names: &[String], value: f64) -> String {
        let rounded = value.round();
        if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        names.get(rounded as usize).cloned().unwrap_or_default()
    }
}

/// District closest to a plot position, with both axes scaled to the data extent.
pub fn nearest_cluster_point(points: &[ClusterPoint], x: f64, y: f64) -> Option<&ClusterPoint> {
    let x_scale = points.iter().map(|p| p.total_approved.abs()).fold(1.0, f64::max);
    let y_scale = points.iter().map(|p| p.total_relief.abs()).fold(1.0, f64::max);
    let distance = |p: &ClusterPoint| {
        let dx = (p.total_approved - x) / x_scale;
        let dy = (p.total_relief - y) / y_scale;
        dx * dx + dy * dy
    };

    points
        .iter()
        .min_by(|a, b| distance(*a).total_cmp(&distance(*b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<DistrictRecord> {
        let mut rows = vec![
            DistrictRecord::new("1", "Jhapa", [2410.0, 602.0, 455.0], [310.0, 64.0, 30.0]),
            DistrictRecord::new("3", "Kathmandu", [1980.0, 720.0, 690.0], [120.0, 33.0, 21.0]),
            DistrictRecord::new("4", "Manang", [78.0, 12.0, 8.0], [6.0, 1.0, 0.0]),
        ];
        rows[0].cluster = Some(1);
        rows[1].cluster = Some(1);
        rows[2].cluster = Some(0);
        rows
    }

    #[test]
    fn test_nearest_cluster_point_names_district() {
        let data = ChartData::build(rows());

        let near_manang = nearest_cluster_point(&data.clusters, 120.0, 10.0).unwrap();
        assert_eq!(near_manang.district, "Manang");
        let near_jhapa = nearest_cluster_point(&data.clusters, 3400.0, 390.0).unwrap();
        assert_eq!(near_jhapa.district, "Jhapa");
        assert!(nearest_cluster_point(&[], 0.0, 0.0).is_none());
    }

    #[test]
    fn test_build_chart_data() {
        let data = ChartData::build(rows());

        assert_eq!(data.metrics.district_count, 3);
        assert_eq!(data.approved_stats.count, 3);
        assert_eq!(data.approved_stats.median, 3390.0);
        assert_eq!(data.top[0].district, "Jhapa");
        assert_eq!(data.bottom[0].district, "Manang");
        assert_eq!(data.comparison.len(), 6);
        assert_eq!(data.province_totals.len(), 3);
        assert!((data.province_shares.iter().sum::<f64>() - 100.0).abs() < 1e-9);
        assert_eq!(data.cluster_count(), 2);
        assert_eq!(
            data.histogram.as_ref().unwrap().counts.iter().sum::<usize>(),
            3
        );
    }

    #[test]
    fn test_build_empty_selection() {
        let data = ChartData::build(Vec::new());

        assert!(data.is_empty());
        assert!(data.histogram.is_none());
        assert!(data.boxplot.is_none());
        assert!(data.kde.is_empty());
        assert_eq!(data.cluster_count(), 0);
    }

    #[test]
    fn test_pie_angles_cover_full_circle() {
        let angles = pie_angles(&[25.0, 25.0, 50.0]);

        assert_eq!(angles[0].0, FRAC_PI_2);
        assert!((angles[0].1 - TAU / 4.0).abs() < 1e-12);
        let end = angles[2].0 + angles[2].1;
        assert!((end - (FRAC_PI_2 + TAU)).abs() < 1e-12);
    }

    #[test]
    fn test_pie_slice_starts_at_center_and_stays_on_radius() {
        let slice = pie_slice(0.0, FRAC_PI_2, 2.0);

        assert_eq!(slice[0], [0.0, 0.0]);
        for p in &slice[1..] {
            let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
            assert!((r - 2.0).abs() < 1e-9);
        }
        let last = slice[slice.len() - 1];
        assert!(last[0].abs() < 1e-9 && (last[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_index_label() {
        let names = vec!["Manang".to_string(), "Jhapa".to_string()];
        assert_eq!(ChartPlotter::index_label(&names, 1.0), "Jhapa");
        assert_eq!(ChartPlotter::index_label(&names, 0.5), "");
        assert_eq!(ChartPlotter::index_label(&names, 5.0), "");
        assert_eq!(ChartPlotter::index_label(&names, -1.0), "");
    }
}
