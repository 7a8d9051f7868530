//! Command line configuration.

use crate::data::loader::DEFAULT_SENTINEL;
use crate::data::PrepareOptions;
use crate::stats::clustering::DEFAULT_CLUSTERS;
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser, Debug, Clone)]
#[command(name = "staffing-dashboard")]
#[command(about = "Teacher staffing dashboard for community schools")]
pub struct Args {
    /// Path to the staffing CSV
    #[arg(long, default_value = "data/data.csv")]
    pub csv: PathBuf,

    /// Number of k-means groups for the scatter plot (0 disables clustering)
    #[arg(long, default_value_t = DEFAULT_CLUSTERS)]
    pub clusters: usize,

    /// Province/District value marking aggregate rows
    #[arg(long, default_value = DEFAULT_SENTINEL)]
    pub sentinel: String,

    /// Restrict the selection to these provinces (repeatable)
    #[arg(long = "province", value_name = "PROVINCE")]
    pub provinces: Vec<String>,

    /// Print the summary metrics as JSON and exit
    #[arg(long)]
    pub summary: bool,

    /// Render the static charts into DIR and exit
    #[arg(long, value_name = "DIR")]
    pub export_charts: Option<PathBuf>,

    /// Write the selected rows as JSON to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub dump_json: Option<PathBuf>,
}

impl Args {
    pub fn prepare_options(&self) -> PrepareOptions {
        PrepareOptions {
            sentinel: self.sentinel.clone(),
            n_clusters: self.clusters,
        }
    }

    /// True when any flag asks for output without the window.
    pub fn is_headless(&self) -> bool {
        self.summary || self.export_charts.is_some() || self.dump_json.is_some()
    }

    /// Initial province selection: the requested ones, or every province.
    pub fn selection(&self, available: &[String]) -> Vec<String> {
        if self.provinces.is_empty() {
            return available.to_vec();
        }

        for requested in &self.provinces {
            if !available.contains(requested) {
                warn!("Province '{}' does not occur in the data", requested);
            }
        }

        available
            .iter()
            .filter(|p| self.provinces.contains(p))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available() -> Vec<String> {
        ["1", "2", "3"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["staffing-dashboard"]).unwrap();

        assert_eq!(args.csv, PathBuf::from("data/data.csv"));
        assert_eq!(args.prepare_options(), PrepareOptions::default());
        assert!(!args.is_headless());
        assert_eq!(args.selection(&available()), available());
    }

    #[test]
    fn test_repeated_province_flags() {
        let args = Args::try_parse_from([
            "staffing-dashboard",
            "--province",
            "3",
            "--province",
            "1",
            "--province",
            "9",
            "--summary",
        ])
        .unwrap();

        assert!(args.is_headless());
        assert_eq!(args.selection(&available()), vec!["1", "3"]);
    }

    #[test]
    fn test_cluster_and_sentinel_overrides() {
        let args = Args::try_parse_from([
            "staffing-dashboard",
            "--clusters",
            "0",
            "--sentinel",
            "TOTAL",
            "--csv",
            "other.csv",
        ])
        .unwrap();

        let options = args.prepare_options();
        assert_eq!(options.n_clusters, 0);
        assert_eq!(options.sentinel, "TOTAL");
        assert_eq!(args.csv, PathBuf::from("other.csv"));
    }
}
