//! Dashboard Main Application
//! Main window with the filter panel and the chart dashboard.

use crate::charts::{ChartData, StaticChartRenderer};
use crate::config::Args;
use crate::data::{self, DataLoader, DataProcessor, DistrictRecord};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info, warn};

/// CSV loading result from background thread
enum LoadResult {
    Complete {
        path: PathBuf,
        records: Vec<DistrictRecord>,
    },
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    loader: DataLoader,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    /// Command line selection, applied to the first load only
    startup: Option<Args>,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, args: Args) -> Self {
        let mut app = Self {
            loader: DataLoader::new(args.prepare_options()),
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            startup: None,
            load_rx: None,
            is_loading: false,
        };

        let csv = args.csv.clone();
        app.startup = Some(args);
        app.start_load(csv);
        app
    }

    /// Load a CSV file in a background thread.
    fn start_load(&mut self, path: PathBuf) {
        if self.is_loading {
            return;
        }

        self.chart_viewer.clear();
        self.control_panel.csv_path = Some(path.clone());
        self.control_panel.set_status("Loading CSV file...");
        self.control_panel.busy = true;
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let options = self.loader.options().clone();

        thread::spawn(move || {
            let result = match DataLoader::read_records(&path, &options) {
                Ok(records) => LoadResult::Complete { path, records },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { path, records }) => {
                let count = records.len();
                self.loader.set_records(path, records);
                self.finish_load();
                self.control_panel
                    .set_status(&format!("Loaded {} districts", count));
            }
            Ok(LoadResult::Error(e)) => {
                error!("CSV load failed: {}", e);
                self.is_loading = false;
                self.control_panel.busy = false;
                self.control_panel.set_status(&format!("Error: {}", e));
            }
            Err(_) => self.load_rx = Some(rx),
        }
    }

    /// Populate the province filter and draw the first selection.
    fn finish_load(&mut self) {
        self.is_loading = false;
        self.control_panel.busy = false;

        let provinces = self
            .loader
            .records()
            .map(DataProcessor::provinces)
            .unwrap_or_default();

        let initial = match self.startup.take() {
            Some(args) => args.selection(&provinces),
            None => provinces.clone(),
        };

        self.control_panel.update_provinces(provinces, &initial);
        self.refresh_charts();
    }

    /// Rebuild the dashboard series for the ticked provinces.
    fn refresh_charts(&mut self) {
        let Some(records) = self.loader.records() else {
            return;
        };

        let selected = self.control_panel.selected_provinces();
        let filtered = DataProcessor::filter_by_provinces(records, &selected);
        self.chart_viewer.set_chart_data(ChartData::build(filtered));
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.loader.invalidate();
            self.start_load(path);
        }
    }

    /// Render the static charts for the current selection into a folder.
    fn handle_export_charts(&mut self) {
        let Some(data) = &self.chart_viewer.chart_data else {
            self.control_panel.set_status("No charts to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        match StaticChartRenderer::export_all(data, &dir) {
            Ok(paths) => {
                self.control_panel
                    .set_status(&format!("Exported {} charts", paths.len()));
                if let Err(e) = open::that(&dir) {
                    warn!("Could not open {}: {}", dir.display(), e);
                }
            }
            Err(e) => {
                error!("Chart export failed: {}", e);
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }

    /// Write the selected rows as JSON.
    fn handle_export_json(&mut self) {
        let Some(data) = &self.chart_viewer.chart_data else {
            self.control_panel.set_status("No data to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("districts.json")
            .save_file()
        else {
            return;
        };

        match data::write_json(&data.rows, &path) {
            Ok(()) => {
                info!("Wrote {} rows to {}", data.rows.len(), path.display());
                self.control_panel
                    .set_status(&format!("Exported {} rows", data.rows.len()));
            }
            Err(e) => {
                error!("JSON export failed: {}", e);
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Filter Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::SelectionChanged => self.refresh_charts(),
                        ControlPanelAction::ExportCharts => self.handle_export_charts(),
                        ControlPanelAction::ExportJson => self.handle_export_json(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
