//! Staffing Dashboard - Teacher posts per district
//!
//! Loads the community-school staffing CSV and shows descriptive statistics,
//! charts and k-means groups with a province filter.

mod charts;
mod config;
mod data;
mod gui;
mod stats;

use anyhow::{Context, Result};
use charts::{ChartData, StaticChartRenderer};
use clap::Parser;
use config::Args;
use data::{DataLoader, DataProcessor};
use eframe::egui;
use gui::DashboardApp;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    if args.is_headless() {
        return run_headless(&args);
    }

    info!("Starting dashboard for {}", args.csv.display());

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Teacher Distribution Dashboard"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Teacher Distribution Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, args)))),
    )
    .map_err(|e| anyhow::anyhow!("Dashboard window failed: {}", e))
}

/// Summary, JSON dump and chart export without opening a window.
fn run_headless(args: &Args) -> Result<()> {
    let mut loader = DataLoader::new(args.prepare_options());
    let records = loader
        .load(&args.csv)
        .with_context(|| format!("Failed to prepare {}", args.csv.display()))?;

    let selected = args.selection(&DataProcessor::provinces(records));
    let filtered = DataProcessor::filter_by_provinces(records, &selected);
    info!(
        "Selected {} of {} districts across {} provinces",
        filtered.len(),
        records.len(),
        selected.len()
    );

    let chart_data = ChartData::build(filtered);

    if let Some(path) = &args.dump_json {
        data::write_json(&chart_data.rows, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} rows to {}", chart_data.rows.len(), path.display());
    }

    if args.summary {
        let summary = serde_json::json!({
            "metrics": chart_data.metrics,
            "approved_stats": chart_data.approved_stats,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if let Some(dir) = &args.export_charts {
        let paths = StaticChartRenderer::export_all(&chart_data, dir)
            .with_context(|| format!("Failed to export charts to {}", dir.display()))?;
        for path in paths {
            println!("{}", path.display());
        }
    }

    Ok(())
}
