//! Stats module - Descriptive statistics and clustering

mod calculator;
pub mod clustering;

pub use calculator::{
    format_thousands, BoxplotStats, DescriptiveStats, Histogram, StatsCalculator, SummaryMetrics,
    HISTOGRAM_BINS,
};
