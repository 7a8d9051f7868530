//! Static Chart Renderer
//! Draws the dashboard charts with plotters into in-memory bitmaps and
//! writes them out as PNG files.
//!
//! Charts:
//! 1. Distribution of total approved teachers (histogram + density line)
//! 2. Top / bottom districts (horizontal bars)
//! 3. Boxplot of total approved teachers
//! 4. Share of approved teachers by province (pie)
//! 5. K-Means groups (scatter, only when clusters were assigned)

use crate::charts::plotter::PALETTE;
use crate::charts::ChartData;
use crate::data::DistrictRecord;
use crate::stats::BoxplotStats;
use egui::Color32;
use image::RgbImage;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const CHART_WIDTH: u32 = 1200;
pub const CHART_HEIGHT: u32 = 700;

const FONT: &str = "sans-serif";
const SKY: RGBColor = RGBColor(135, 206, 235);
const BAR_BLUE: RGBColor = RGBColor(49, 102, 160);
const BAR_RED: RGBColor = RGBColor(178, 34, 34);
const BOX_GREEN: RGBColor = RGBColor(144, 238, 144);
/// Half height of the boxplot box in chart units.
const BOX_HALF_HEIGHT: f32 = 0.35;
/// Half height of the whisker caps in chart units.
const CAP_HALF_HEIGHT: f32 = 0.15;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Nothing to draw for {0}")]
    NoData(&'static str),
    #[error("Bitmap buffer size mismatch")]
    Buffer,
    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn drawing(e: impl std::fmt::Display) -> RenderError {
    RenderError::Drawing(e.to_string())
}

/// Charts available for static export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticChart {
    Histogram,
    TopDistricts,
    BottomDistricts,
    Boxplot,
    ProvinceShare,
    Clusters,
}

impl StaticChart {
    pub const ALL: [StaticChart; 6] = [
        StaticChart::Histogram,
        StaticChart::TopDistricts,
        StaticChart::BottomDistricts,
        StaticChart::Boxplot,
        StaticChart::ProvinceShare,
        StaticChart::Clusters,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            StaticChart::Histogram => "approved_distribution.png",
            StaticChart::TopDistricts => "top_districts.png",
            StaticChart::BottomDistricts => "bottom_districts.png",
            StaticChart::Boxplot => "approved_boxplot.png",
            StaticChart::ProvinceShare => "province_share.png",
            StaticChart::Clusters => "district_clusters.png",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StaticChart::Histogram => "Distribution of Total Approved Teachers",
            StaticChart::TopDistricts => "Top 10 Districts",
            StaticChart::BottomDistricts => "Bottom 10 Districts",
            StaticChart::Boxplot => "Boxplot of Total Approved Teachers",
            StaticChart::ProvinceShare => "Approved Teachers by Province",
            StaticChart::Clusters => "K-Means Groups of Districts",
        }
    }

    /// Whether the selection carries the series this chart needs.
    pub fn is_available(&self, data: &ChartData) -> bool {
        match self {
            StaticChart::Clusters => data.cluster_count() > 0,
            StaticChart::ProvinceShare => data.metrics.total_approved > 0.0,
            _ => !data.is_empty(),
        }
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every available chart into `dir`, in parallel.
    ///
    /// Returns the written file paths in chart order.
    /// Fails with `NoData` when the selection has nothing to draw.
    pub fn export_all(data: &ChartData, dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
        let charts: Vec<StaticChart> = StaticChart::ALL
            .iter()
            .copied()
            .filter(|c| c.is_available(data))
            .collect();
        if charts.is_empty() {
            return Err(RenderError::NoData("the current selection"));
        }

        fs::create_dir_all(dir)?;

        let paths = charts
            .par_iter()
            .map(|chart| {
                let bitmap = Self::render(*chart, data, CHART_WIDTH, CHART_HEIGHT)?;
                let path = dir.join(chart.file_name());
                bitmap.save(&path)?;
                debug!("Wrote {}", path.display());
                Ok(path)
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        info!("Exported {} charts to {}", paths.len(), dir.display());
        Ok(paths)
    }

    /// Render one chart to an RGB image.
    pub fn render(
        chart: StaticChart,
        data: &ChartData,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, RenderError> {
        if !chart.is_available(data) {
            return Err(RenderError::NoData(chart.title()));
        }

        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(drawing)?;

            match chart {
                StaticChart::Histogram => Self::draw_histogram(&root, data)?,
                StaticChart::TopDistricts => {
                    Self::draw_ranking(&root, chart.title(), &data.top, BAR_BLUE)?
                }
                StaticChart::BottomDistricts => {
                    Self::draw_ranking(&root, chart.title(), &data.bottom, BAR_RED)?
                }
                StaticChart::Boxplot => Self::draw_boxplot(&root, data)?,
                StaticChart::ProvinceShare => Self::draw_pie(&root, data)?,
                StaticChart::Clusters => Self::draw_clusters(&root, data)?,
            }

            root.present().map_err(drawing)?;
        }

        RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer)
    }

    fn draw_histogram(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        data: &ChartData,
    ) -> Result<(), RenderError> {
        let h = data
            .histogram
            .as_ref()
            .ok_or(RenderError::NoData(StaticChart::Histogram.title()))?;

        let x_end = h.start + h.bin_width * h.counts.len() as f64;
        let max_count = h.counts.iter().copied().max().unwrap_or(0) as f64;
        let max_kde = data.kde.iter().map(|p| p[1]).fold(0.0, f64::max);
        let y_end = (max_count.max(max_kde) * 1.1).max(1.0);

        let mut chart = ChartBuilder::on(root)
            .caption(StaticChart::Histogram.title(), (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(h.start..x_end, 0f64..y_end)
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .x_desc("Number of Approved Teachers")
            .y_desc("Number of Districts")
            .draw()
            .map_err(drawing)?;

        chart
            .draw_series(h.counts.iter().enumerate().map(|(i, &count)| {
                let x0 = h.start + i as f64 * h.bin_width;
                Rectangle::new([(x0, 0.0), (x0 + h.bin_width, count as f64)], SKY.filled())
            }))
            .map_err(drawing)?;

        chart
            .draw_series(LineSeries::new(
                data.kde.iter().map(|p| (p[0], p[1])),
                BAR_BLUE.stroke_width(2),
            ))
            .map_err(drawing)?;

        Ok(())
    }

    fn draw_ranking(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        title: &str,
        rows: &[DistrictRecord],
        color: RGBColor,
    ) -> Result<(), RenderError> {
        let n = rows.len();
        let x_end = rows.iter().map(|r| r.total_approved).fold(0.0, f64::max).max(1.0) * 1.1;

        // Slot 0 is the bottom row, so the first record is drawn on top
        let label_for = |slot: i32| -> String {
            usize::try_from(slot)
                .ok()
                .filter(|&s| s < n)
                .map(|s| rows[n - 1 - s].district.clone())
                .unwrap_or_default()
        };

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(150)
            .build_cartesian_2d(0f64..x_end, (0..n as i32).into_segmented())
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n + 1)
            .y_label_formatter(&|v| match v {
                SegmentValue::CenterOf(slot) => label_for(*slot),
                _ => String::new(),
            })
            .x_desc("Approved Teachers")
            .y_desc("District")
            .draw()
            .map_err(drawing)?;

        chart
            .draw_series(
                Histogram::horizontal(&chart)
                    .style(color.filled())
                    .margin(6)
                    .data(
                        rows.iter()
                            .enumerate()
                            .map(|(i, r)| ((n - 1 - i) as i32, r.total_approved)),
                    ),
            )
            .map_err(drawing)?;

        Ok(())
    }

    fn draw_boxplot(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        data: &ChartData,
    ) -> Result<(), RenderError> {
        let b = data
            .boxplot
            .as_ref()
            .ok_or(RenderError::NoData(StaticChart::Boxplot.title()))?;
        let geometry = BoxGeometry::from_stats(b);

        let lo = b.outliers.iter().copied().fold(b.whisker_low, f64::min);
        let hi = b.outliers.iter().copied().fold(b.whisker_high, f64::max);
        let pad = ((hi - lo) * 0.08).max(1.0);
        let x_range = (lo - pad) as f32..(hi + pad) as f32;

        let mut chart = ChartBuilder::on(root)
            .caption(StaticChart::Boxplot.title(), (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(20)
            .build_cartesian_2d(x_range, -1f32..1f32)
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(0)
            .x_desc("Total Approved Teachers")
            .draw()
            .map_err(drawing)?;

        let [_, q1, median, q3, _] = geometry.values;
        chart
            .draw_series([
                Rectangle::new(
                    [(q1, -BOX_HALF_HEIGHT), (q3, BOX_HALF_HEIGHT)],
                    BOX_GREEN.mix(0.9).filled(),
                ),
                Rectangle::new(
                    [(q1, -BOX_HALF_HEIGHT), (q3, BOX_HALF_HEIGHT)],
                    BLACK.stroke_width(2),
                ),
            ])
            .map_err(drawing)?;

        chart
            .draw_series(
                geometry
                    .segments()
                    .into_iter()
                    .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
            )
            .map_err(drawing)?;

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(median, -BOX_HALF_HEIGHT), (median, BOX_HALF_HEIGHT)],
                BAR_RED.stroke_width(3),
            )))
            .map_err(drawing)?;

        chart
            .draw_series(
                b.outliers
                    .iter()
                    .map(|&v| Circle::new((v as f32, 0f32), 5, BLACK.filled())),
            )
            .map_err(drawing)?;

        Ok(())
    }

    fn draw_pie(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        data: &ChartData,
    ) -> Result<(), RenderError> {
        let area = root
            .titled(StaticChart::ProvinceShare.title(), (FONT, 28))
            .map_err(drawing)?;

        let (w, h) = area.dim_in_pixel();
        let center = ((w / 2) as i32, (h / 2) as i32);
        let radius = f64::from(w.min(h)) * 0.38;

        let slices = counter_clockwise_slices(&data.province_totals);
        let sizes: Vec<f64> = slices.iter().map(|s| s.size).collect();
        let colors: Vec<RGBColor> = slices.iter().map(|s| s.color).collect();
        let labels: Vec<String> = slices.iter().map(|s| s.label.clone()).collect();

        // Plotters sweeps clockwise on screen; -90 is the top of the circle
        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style((FONT, 20).into_font().color(&BLACK));
        pie.percentages((FONT, 18).into_font().color(&BLACK));
        area.draw(&pie).map_err(drawing)?;

        Ok(())
    }

    fn draw_clusters(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        data: &ChartData,
    ) -> Result<(), RenderError> {
        let x_end = data
            .clusters
            .iter()
            .map(|p| p.total_approved)
            .fold(0.0, f64::max)
            .max(1.0)
            * 1.1;
        let y_end = data
            .clusters
            .iter()
            .map(|p| p.total_relief)
            .fold(0.0, f64::max)
            .max(1.0)
            * 1.1;

        let mut chart = ChartBuilder::on(root)
            .caption(StaticChart::Clusters.title(), (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..x_end, 0f64..y_end)
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .x_desc("Total Approved Teachers")
            .y_desc("Total Relief Teachers")
            .draw()
            .map_err(drawing)?;

        for cluster in 0..data.cluster_count() {
            let color = to_rgb(PALETTE[cluster % PALETTE.len()].gamma_multiply(1.4));
            chart
                .draw_series(
                    data.clusters
                        .iter()
                        .filter(|p| p.cluster == cluster)
                        .map(|p| Circle::new((p.total_approved, p.total_relief), 6, color.filled())),
                )
                .map_err(drawing)?
                .label(format!("Cluster {}", cluster))
                .legend(move |(x, y)| Circle::new((x, y), 6, color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(drawing)?;

        Ok(())
    }
}

/// Box and whisker positions of the static boxplot.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoxGeometry {
    /// Lower whisker, q1, median, q3, upper whisker.
    values: [f32; 5],
}

impl BoxGeometry {
    fn from_stats(b: &BoxplotStats) -> Self {
        Self {
            values: [b.whisker_low, b.q1, b.median, b.q3, b.whisker_high].map(|v| v as f32),
        }
    }

    /// Whisker lines from the box edges plus their end caps.
    fn segments(&self) -> Vec<Vec<(f32, f32)>> {
        let [low, q1, _, q3, high] = self.values;
        vec![
            vec![(low, 0.0), (q1, 0.0)],
            vec![(q3, 0.0), (high, 0.0)],
            vec![(low, -CAP_HALF_HEIGHT), (low, CAP_HALF_HEIGHT)],
            vec![(high, -CAP_HALF_HEIGHT), (high, CAP_HALF_HEIGHT)],
        ]
    }
}

struct PieSlice {
    size: f64,
    color: RGBColor,
    label: String,
}

/// Slices ordered for a clockwise sweep from the top so that the first
/// province starts at 90 degrees and the rest follow counter-clockwise.
fn counter_clockwise_slices(totals: &[(String, f64)]) -> Vec<PieSlice> {
    let mut slices: Vec<PieSlice> = totals
        .iter()
        .enumerate()
        .map(|(i, (province, total))| PieSlice {
            size: *total,
            color: to_rgb(PALETTE[i % PALETTE.len()]),
            label: format!("Province {}", province),
        })
        .collect();
    slices.reverse();
    slices
}

fn to_rgb(color: Color32) -> RGBColor {
    RGBColor(color.r(), color.g(), color.b())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(with_clusters: bool) -> ChartData {
        let mut rows = vec![
            DistrictRecord::new("1", "Jhapa", [2410.0, 602.0, 455.0], [310.0, 64.0, 30.0]),
            DistrictRecord::new("4", "Manang", [78.0, 12.0, 8.0], [6.0, 1.0, 0.0]),
        ];
        if with_clusters {
            rows[0].cluster = Some(1);
            rows[1].cluster = Some(0);
        }
        ChartData::build(rows)
    }

    #[test]
    fn test_file_names_are_unique_pngs() {
        let mut names: Vec<&str> = StaticChart::ALL.iter().map(|c| c.file_name()).collect();
        assert!(names.iter().all(|n| n.ends_with(".png")));
        names.sort();
        names.dedup();
        assert_eq!(names.len(), StaticChart::ALL.len());
    }

    #[test]
    fn test_cluster_chart_needs_labels() {
        assert!(!StaticChart::Clusters.is_available(&data(false)));
        assert!(StaticChart::Clusters.is_available(&data(true)));
        assert!(StaticChart::Histogram.is_available(&data(false)));
    }

    #[test]
    fn test_empty_selection_has_no_charts() {
        let empty = ChartData::build(Vec::new());
        assert!(StaticChart::ALL.iter().all(|c| !c.is_available(&empty)));
        assert!(matches!(
            StaticChartRenderer::render(StaticChart::Histogram, &empty, 100, 100),
            Err(RenderError::NoData(_))
        ));
    }

    #[test]
    fn test_export_all_fails_for_empty_selection() {
        let dir = std::env::temp_dir().join(format!("charts_empty_{}", std::process::id()));
        let result = StaticChartRenderer::export_all(&ChartData::build(Vec::new()), &dir);

        assert!(matches!(result, Err(RenderError::NoData(_))));
        assert!(!dir.exists());
    }

    #[test]
    fn test_box_geometry_uses_clamped_whiskers() {
        let values = [10.0, 12.0, 11.0, 13.0, 12.0, 95.0];
        let stats = crate::stats::StatsCalculator::boxplot_stats(&values).unwrap();
        let geometry = BoxGeometry::from_stats(&stats);

        assert_eq!(geometry.values[0], 10.0);
        assert_eq!(geometry.values[4], 13.0);
        assert_eq!(stats.outliers, vec![95.0]);

        let segments = geometry.segments();
        assert_eq!(segments[0], vec![(10.0, 0.0), (stats.q1 as f32, 0.0)]);
        assert_eq!(segments[1], vec![(stats.q3 as f32, 0.0), (13.0, 0.0)]);
    }

    #[test]
    fn test_pie_slices_reverse_for_counter_clockwise_sweep() {
        let totals = vec![
            ("1".to_string(), 30.0),
            ("2".to_string(), 20.0),
            ("3".to_string(), 50.0),
        ];
        let slices = counter_clockwise_slices(&totals);

        let labels: Vec<&str> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Province 3", "Province 2", "Province 1"]);
        assert_eq!(slices[2].color, to_rgb(PALETTE[0]));
        assert_eq!(slices[0].size, 50.0);
    }

    #[test]
    fn test_to_rgb() {
        let c = to_rgb(Color32::from_rgb(1, 2, 3));
        assert_eq!((c.0, c.1, c.2), (1, 2, 3));
    }
}
