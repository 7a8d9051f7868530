//! District Record Module
//! One prepared row of the staffing table.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Teacher posting counts for one (province, district) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRecord {
    pub province: String,
    pub district: String,
    pub approved_primary: f64,
    pub approved_lower_secondary: f64,
    pub approved_secondary: f64,
    pub relief_primary: f64,
    pub relief_lower_secondary: f64,
    pub relief_secondary: f64,
    pub total_approved: f64,
    pub total_relief: f64,
    /// Set by the k-means pass; `None` when clustering is disabled.
    pub cluster: Option<usize>,
}

impl DistrictRecord {
    /// Build a record from its raw counts, deriving both totals.
    pub fn new(
        province: impl Into<String>,
        district: impl Into<String>,
        approved: [f64; 3],
        relief: [f64; 3],
    ) -> Self {
        let [approved_primary, approved_lower_secondary, approved_secondary] = approved;
        let [relief_primary, relief_lower_secondary, relief_secondary] = relief;

        Self {
            province: province.into(),
            district: district.into(),
            approved_primary,
            approved_lower_secondary,
            approved_secondary,
            relief_primary,
            relief_lower_secondary,
            relief_secondary,
            total_approved: approved_primary + approved_lower_secondary + approved_secondary,
            total_relief: relief_primary + relief_lower_secondary + relief_secondary,
            cluster: None,
        }
    }

    /// True when either identifier is an aggregate placeholder such as `ALL`.
    pub fn is_aggregate(&self, sentinel: &str) -> bool {
        is_sentinel(&self.province, sentinel) || is_sentinel(&self.district, sentinel)
    }
}

/// Write rows as a pretty-printed JSON array.
pub fn write_json(rows: &[DistrictRecord], path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), rows)?;
    Ok(())
}

/// Case-insensitive match of a trimmed identifier against the aggregate marker.
pub fn is_sentinel(value: &str, sentinel: &str) -> bool {
    value.trim().eq_ignore_ascii_case(sentinel.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_totals() {
        let r = DistrictRecord::new("1", "Jhapa", [120.0, 40.0, 25.0], [10.0, 3.0, 1.0]);
        assert_eq!(r.total_approved, 185.0);
        assert_eq!(r.total_relief, 14.0);
        assert_eq!(r.cluster, None);
    }

    #[test]
    fn test_is_aggregate_matches_either_identifier() {
        let by_province = DistrictRecord::new("ALL", "Jhapa", [0.0; 3], [0.0; 3]);
        let by_district = DistrictRecord::new("3", " all ", [0.0; 3], [0.0; 3]);
        let regular = DistrictRecord::new("3", "Kathmandu", [0.0; 3], [0.0; 3]);

        assert!(by_province.is_aggregate("ALL"));
        assert!(by_district.is_aggregate("ALL"));
        assert!(!regular.is_aggregate("ALL"));
    }

    #[test]
    fn test_write_json_round_trips_rows() {
        let mut row = DistrictRecord::new("3", "Lalitpur", [905.0, 280.0, 262.0], [64.0, 15.0, 9.0]);
        row.cluster = Some(1);
        let path = std::env::temp_dir().join(format!(
            "staffing_dashboard_rows_{}.json",
            std::process::id()
        ));

        write_json(std::slice::from_ref(&row), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let parsed: Vec<DistrictRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, vec![row]);
        assert!(text.contains("\"total_approved\": 1447.0"));
    }
}
