//! Statistics Calculator Module
//! Handles the dashboard metrics, descriptive stats, histogram bins and the
//! kernel density overlay.

use crate::data::DistrictRecord;
use serde::Serialize;
use statrs::distribution::{Continuous, Normal};
use std::collections::HashSet;

/// Number of histogram bins on the distribution chart
pub const HISTOGRAM_BINS: usize = 20;

/// Whisker reach in multiples of the interquartile range.
const WHISKER_IQR: f64 = 1.5;

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub district_count: usize,
    pub total_approved: f64,
    pub total_relief: f64,
    pub avg_approved: Option<f64>,
    pub max_approved: Option<f64>,
    pub min_approved: Option<f64>,
}

impl SummaryMetrics {
    /// Compute the metric row for a (filtered) selection.
    pub fn compute(records: &[DistrictRecord]) -> Self {
        let district_count = records
            .iter()
            .map(|r| r.district.as_str())
            .collect::<HashSet<_>>()
            .len();

        let approved: Vec<f64> = records.iter().map(|r| r.total_approved).collect();
        let total_approved = approved.iter().sum();
        let total_relief = records.iter().map(|r| r.total_relief).sum();

        let (avg_approved, max_approved, min_approved) = if approved.is_empty() {
            (None, None, None)
        } else {
            (
                Some(total_approved / approved.len() as f64),
                approved.iter().copied().reduce(f64::max),
                approved.iter().copied().reduce(f64::min),
            )
        };

        Self {
            district_count,
            total_approved,
            total_relief,
            avg_approved,
            max_approved,
            min_approved,
        }
    }
}

/// Descriptive statistics for an array of values.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub variance: f64,
    pub q1: f64,
    pub q3: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for DescriptiveStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            variance: f64::NAN,
            q1: f64::NAN,
            q3: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Five-number summary plus outliers, as drawn by a boxplot.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxplotStats {
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Equal-width bins over the value range.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub start: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Center of bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        self.start + (i as f64 + 0.5) * self.bin_width
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> DescriptiveStats {
        let n = values.len();
        if n == 0 {
            return DescriptiveStats::default();
        }

        let sorted = Self::sorted(values);

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = Self::percentile(&sorted, 50.0);

        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        DescriptiveStats {
            count: n,
            mean,
            median,
            std: variance.sqrt(),
            variance,
            q1: Self::percentile(&sorted, 25.0),
            q3: Self::percentile(&sorted, 75.0),
            min: sorted[0],
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Boxplot geometry: quartiles, 1.5·IQR whiskers clamped to data, outliers.
    pub fn boxplot_stats(values: &[f64]) -> Option<BoxplotStats> {
        if values.is_empty() {
            return None;
        }

        let sorted = Self::sorted(values);
        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < low_fence || v > high_fence)
            .collect();

        Some(BoxplotStats {
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
            outliers,
        })
    }

    /// Bin values into `bins` equal-width buckets spanning [min, max].
    ///
    /// The last bucket is closed on the right so the maximum is counted.
    pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
        if values.is_empty() || bins == 0 {
            return None;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // A single distinct value gets a unit-wide range around it
        let (start, end) = if max > min {
            (min, max)
        } else {
            (min - 0.5, max + 0.5)
        };
        let bin_width = (end - start) / bins as f64;

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - start) / bin_width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Some(Histogram {
            start,
            bin_width,
            counts,
        })
    }

    /// Gaussian kernel density estimate over the data range.
    ///
    /// Uses Scott's rule for the bandwidth. The density is multiplied by
    /// `scale` (n × bin width puts it on the histogram's count axis).
    /// Returns no points when the bandwidth collapses to zero.
    pub fn kde_curve(values: &[f64], points: usize, scale: f64) -> Vec<[f64; 2]> {
        let stats = Self::compute_descriptive_stats(values);
        if stats.count < 2 || points < 2 {
            return Vec::new();
        }

        let bandwidth = stats.std * (stats.count as f64).powf(-1.0 / 5.0);
        let Ok(kernel) = Normal::new(0.0, bandwidth) else {
            return Vec::new();
        };

        let step = (stats.max - stats.min) / (points - 1) as f64;
        (0..points)
            .map(|i| {
                let x = stats.min + i as f64 * step;
                let density = values.iter().map(|v| kernel.pdf(x - v)).sum::<f64>()
                    / stats.count as f64;
                [x, density * scale]
            })
            .collect()
    }

    /// Percent share of each slice in the whole.
    pub fn share_percentages(totals: &[f64]) -> Vec<f64> {
        let sum: f64 = totals.iter().sum();
        if sum <= 0.0 {
            return vec![0.0; totals.len()];
        }
        totals.iter().map(|t| t / sum * 100.0).collect()
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }
}

/// Render a count with thousands separators, rounded to an integer.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<DistrictRecord> {
        vec![
            DistrictRecord::new("1", "Jhapa", [2410.0, 602.0, 455.0], [310.0, 64.0, 30.0]),
            DistrictRecord::new("1", "Taplejung", [812.0, 164.0, 121.0], [96.0, 21.0, 8.0]),
            DistrictRecord::new("4", "Manang", [78.0, 12.0, 8.0], [6.0, 1.0, 0.0]),
        ]
    }

    #[test]
    fn test_summary_metrics() {
        let m = SummaryMetrics::compute(&records());

        assert_eq!(m.district_count, 3);
        assert_eq!(m.total_approved, 3467.0 + 1097.0 + 98.0);
        assert_eq!(m.total_relief, 404.0 + 125.0 + 7.0);
        assert_eq!(m.max_approved, Some(3467.0));
        assert_eq!(m.min_approved, Some(98.0));
        assert!((m.avg_approved.unwrap() - 4662.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_metrics_empty_selection() {
        let m = SummaryMetrics::compute(&[]);
        assert_eq!(m.district_count, 0);
        assert_eq!(m.total_approved, 0.0);
        assert_eq!(m.avg_approved, None);
        assert_eq!(m.max_approved, None);
    }

    #[test]
    fn test_descriptive_stats() {
        let s = StatsCalculator::compute_descriptive_stats(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.q1, 1.75);
        assert_eq!(s.q3, 3.25);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!((s.variance - 5.0 / 3.0).abs() < 1e-12);

        assert!(StatsCalculator::compute_descriptive_stats(&[]).mean.is_nan());
    }

    #[test]
    fn test_boxplot_stats_flags_outliers() {
        let values = [10.0, 12.0, 11.0, 13.0, 12.0, 95.0];
        let b = StatsCalculator::boxplot_stats(&values).unwrap();

        assert_eq!(b.outliers, vec![95.0]);
        assert_eq!(b.whisker_high, 13.0);
        assert_eq!(b.whisker_low, 10.0);
        assert!(StatsCalculator::boxplot_stats(&[]).is_none());
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let h = StatsCalculator::histogram(&values, 5).unwrap();

        assert_eq!(h.start, 0.0);
        assert_eq!(h.bin_width, 2.0);
        assert_eq!(h.counts, vec![2, 2, 2, 2, 3]);
        assert_eq!(h.counts.iter().sum::<usize>(), values.len());
        assert_eq!(h.bin_center(0), 1.0);
    }

    #[test]
    fn test_histogram_single_value() {
        let h = StatsCalculator::histogram(&[7.0, 7.0], 4).unwrap();
        assert_eq!(h.counts.iter().sum::<usize>(), 2);
        assert!(StatsCalculator::histogram(&[], 4).is_none());
    }

    #[test]
    fn test_kde_curve_integrates_to_roughly_scale() {
        let values: Vec<f64> = (0..200).map(|i| (i % 20) as f64).collect();
        let curve = StatsCalculator::kde_curve(&values, 200, 1.0);

        assert_eq!(curve.len(), 200);
        assert_eq!(curve[0][0], 0.0);
        assert_eq!(curve[199][0], 19.0);
        let step = curve[1][0] - curve[0][0];
        let area: f64 = curve.iter().map(|p| p[1] * step).sum();
        assert!(area > 0.8 && area < 1.05, "area = {}", area);
    }

    #[test]
    fn test_kde_curve_degenerate_input() {
        assert!(StatsCalculator::kde_curve(&[3.0], 10, 1.0).is_empty());
        assert!(StatsCalculator::kde_curve(&[3.0, 3.0, 3.0], 10, 1.0).is_empty());
    }

    #[test]
    fn test_share_percentages() {
        let shares = StatsCalculator::share_percentages(&[1.0, 3.0]);
        assert_eq!(shares, vec![25.0, 75.0]);
        assert_eq!(StatsCalculator::share_percentages(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1234567.4), "1,234,567");
        assert_eq!(format_thousands(-45210.0), "-45,210");
        assert_eq!(format_thousands(f64::NAN), "-");
    }
}
