//! Data Processor Module
//! Province filtering, rankings and reshaping of prepared district records.

use crate::data::DistrictRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Number of districts shown in the top/bottom rankings.
pub const RANKING_SIZE: usize = 10;

/// Posting category in the long-format table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TeacherType {
    Approved,
    Relief,
}

impl TeacherType {
    pub fn label(&self) -> &'static str {
        match self {
            TeacherType::Approved => "Approved",
            TeacherType::Relief => "Relief",
        }
    }
}

/// One row of the long-format (stacked) table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherTypeCount {
    pub district: String,
    pub teacher_type: TeacherType,
    pub count: f64,
}

/// Filtering and reshaping operations over the prepared table.
pub struct DataProcessor;

impl DataProcessor {
    /// Distinct provinces in order of first appearance.
    pub fn provinces(records: &[DistrictRecord]) -> Vec<String> {
        let mut seen = HashSet::new();
        records
            .iter()
            .filter(|r| seen.insert(r.province.as_str()))
            .map(|r| r.province.clone())
            .collect()
    }

    /// Keep only rows whose province is selected.
    pub fn filter_by_provinces(
        records: &[DistrictRecord],
        selected: &[String],
    ) -> Vec<DistrictRecord> {
        let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
        records
            .iter()
            .filter(|r| selected.contains(r.province.as_str()))
            .cloned()
            .collect()
    }

    /// Districts with the most approved posts, largest first.
    pub fn top_districts(records: &[DistrictRecord], n: usize) -> Vec<DistrictRecord> {
        let mut sorted = records.to_vec();
        sorted.sort_by(|a, b| {
            b.total_approved
                .partial_cmp(&a.total_approved)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.truncate(n);
        sorted
    }

    /// Districts with the fewest approved posts, smallest first.
    pub fn bottom_districts(records: &[DistrictRecord], n: usize) -> Vec<DistrictRecord> {
        let mut sorted = records.to_vec();
        sorted.sort_by(|a, b| {
            a.total_approved
                .partial_cmp(&b.total_approved)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.truncate(n);
        sorted
    }

    /// Sum of approved posts per province, keyed in ascending order.
    pub fn province_totals(records: &[DistrictRecord]) -> Vec<(String, f64)> {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for r in records {
            *totals.entry(r.province.as_str()).or_insert(0.0) += r.total_approved;
        }
        totals
            .into_iter()
            .map(|(province, total)| (province.to_string(), total))
            .collect()
    }

    /// Transform the approved/relief totals to long format (stack operation).
    ///
    /// Districts are ordered by total approved posts, largest first; each
    /// district yields an `Approved` row followed by a `Relief` row.
    pub fn stack_to_long(records: &[DistrictRecord]) -> Vec<TeacherTypeCount> {
        Self::top_districts(records, records.len())
            .into_iter()
            .flat_map(|r| {
                [
                    TeacherTypeCount {
                        district: r.district.clone(),
                        teacher_type: TeacherType::Approved,
                        count: r.total_approved,
                    },
                    TeacherTypeCount {
                        district: r.district,
                        teacher_type: TeacherType::Relief,
                        count: r.total_relief,
                    },
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<DistrictRecord> {
        vec![
            DistrictRecord::new("1", "Jhapa", [2410.0, 602.0, 455.0], [310.0, 64.0, 30.0]),
            DistrictRecord::new("3", "Kathmandu", [1980.0, 720.0, 690.0], [120.0, 33.0, 21.0]),
            DistrictRecord::new("1", "Taplejung", [812.0, 164.0, 121.0], [96.0, 21.0, 8.0]),
            DistrictRecord::new("4", "Manang", [78.0, 12.0, 8.0], [6.0, 1.0, 0.0]),
            DistrictRecord::new("3", "Rasuwa", [310.0, 62.0, 41.0], [38.0, 7.0, 2.0]),
        ]
    }

    #[test]
    fn test_provinces_keep_first_appearance_order() {
        assert_eq!(DataProcessor::provinces(&sample()), vec!["1", "3", "4"]);
        assert!(DataProcessor::provinces(&[]).is_empty());
    }

    #[test]
    fn test_filter_yields_exactly_selected_provinces() {
        let records = sample();
        let selected = vec!["1".to_string(), "4".to_string()];
        let filtered = DataProcessor::filter_by_provinces(&records, &selected);

        let mut provinces = DataProcessor::provinces(&filtered);
        provinces.sort();
        assert_eq!(provinces, selected);
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_filter_with_all_provinces_is_identity() {
        let records = sample();
        let all = DataProcessor::provinces(&records);
        assert_eq!(DataProcessor::filter_by_provinces(&records, &all), records);
    }

    #[test]
    fn test_filter_with_empty_selection_is_empty() {
        assert!(DataProcessor::filter_by_provinces(&sample(), &[]).is_empty());
    }

    #[test]
    fn test_top_and_bottom_districts() {
        let records = sample();

        let top: Vec<String> = DataProcessor::top_districts(&records, 2)
            .into_iter()
            .map(|r| r.district)
            .collect();
        assert_eq!(top, vec!["Jhapa", "Kathmandu"]);

        let bottom: Vec<String> = DataProcessor::bottom_districts(&records, 2)
            .into_iter()
            .map(|r| r.district)
            .collect();
        assert_eq!(bottom, vec!["Manang", "Rasuwa"]);

        assert_eq!(DataProcessor::top_districts(&records, RANKING_SIZE).len(), 5);
    }

    #[test]
    fn test_province_totals_sorted_by_province() {
        let totals = DataProcessor::province_totals(&sample());
        assert_eq!(
            totals,
            vec![
                ("1".to_string(), 3467.0 + 1097.0),
                ("3".to_string(), 3390.0 + 413.0),
                ("4".to_string(), 98.0),
            ]
        );
    }

    #[test]
    fn test_stack_to_long_orders_by_total_approved() {
        let long = DataProcessor::stack_to_long(&sample());

        assert_eq!(long.len(), 10);
        assert_eq!(long[0].district, "Jhapa");
        assert_eq!(long[0].teacher_type, TeacherType::Approved);
        assert_eq!(long[0].count, 3467.0);
        assert_eq!(long[1].teacher_type, TeacherType::Relief);
        assert_eq!(long[1].count, 404.0);
        assert_eq!(long[9].district, "Manang");
    }
}
