//! Staffing CSV Loader Module
//! Reads the district staffing CSV with Polars and prepares `DistrictRecord`s:
//! header renaming, missing-value filling, derived totals, removal of
//! aggregate rows and the optional k-means annotation.

use crate::data::record::is_sentinel;
use crate::data::DistrictRecord;
use crate::stats::clustering::{self, DEFAULT_CLUSTERS};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Placeholder used by the source data for aggregate rows.
pub const DEFAULT_SENTINEL: &str = "ALL";

pub const PROVINCE: &str = "Province";
pub const DISTRICT: &str = "District";
pub const APPROVED_PRIMARY: &str = "Approved_Primary";
pub const APPROVED_LOWER_SECONDARY: &str = "Approved_LowerSecondary";
pub const APPROVED_SECONDARY: &str = "Approved_Secondary";
pub const RELIEF_PRIMARY: &str = "Relief_Primary";
pub const RELIEF_LOWER_SECONDARY: &str = "Relief_LowerSecondary";
pub const RELIEF_SECONDARY: &str = "Relief_Secondary";

/// Source header -> prepared column name, identifier columns.
const ID_COLUMNS: [(&str, &str); 2] = [("Province No", PROVINCE), ("District", DISTRICT)];

/// Source header -> prepared column name, posting counts.
const COUNT_COLUMNS: [(&str, &str); 6] = [
    ("Approved Teacher Posts Primary", APPROVED_PRIMARY),
    ("Approved Teacher Posts Lower Secondary", APPROVED_LOWER_SECONDARY),
    ("Approved Teacher Posts Secondary", APPROVED_SECONDARY),
    ("Rahat Teacher Posts Primary", RELIEF_PRIMARY),
    ("Rahat Teacher Posts Lower Secondary", RELIEF_LOWER_SECONDARY),
    ("Rahat Teacher Posts Secondary", RELIEF_SECONDARY),
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing value in column '{column}' at data row {row}")]
    MissingValue { column: String, row: usize },
    #[error("No data loaded")]
    NoData,
}

/// Knobs of the preparation step.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareOptions {
    /// Province/District value marking aggregate rows.
    pub sentinel: String,
    /// Number of k-means groups; `0` disables clustering.
    pub n_clusters: usize,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            n_clusters: DEFAULT_CLUSTERS,
        }
    }
}

/// Loads the staffing CSV and keeps the prepared table cached per file.
pub struct DataLoader {
    options: PrepareOptions,
    cache: Option<(PathBuf, Vec<DistrictRecord>)>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(PrepareOptions::default())
    }
}

impl DataLoader {
    pub fn new(options: PrepareOptions) -> Self {
        Self {
            options,
            cache: None,
        }
    }

    pub fn options(&self) -> &PrepareOptions {
        &self.options
    }

    /// Load and prepare a CSV file.
    ///
    /// A second call with the same path returns the cached table without
    /// touching the file again.
    pub fn load(&mut self, file_path: impl AsRef<Path>) -> Result<&[DistrictRecord], LoaderError> {
        let file_path = file_path.as_ref();

        let cached = matches!(&self.cache, Some((path, _)) if path == file_path);
        if cached {
            debug!("Using cached table for {}", file_path.display());
        } else {
            let records = Self::read_records(file_path, &self.options)?;
            self.cache = Some((file_path.to_path_buf(), records));
        }

        self.records().ok_or(LoaderError::NoData)
    }

    /// Read and prepare a CSV file, bypassing the cache.
    ///
    /// Used directly by the GUI worker thread; the result is handed back
    /// through [`DataLoader::set_records`].
    pub fn read_records(
        file_path: &Path,
        options: &PrepareOptions,
    ) -> Result<Vec<DistrictRecord>, LoaderError> {
        info!("Reading staffing CSV {}", file_path.display());

        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;

        let records = Self::prepare_frame(df, options)?;
        info!(
            "Prepared {} district rows from {}",
            records.len(),
            file_path.display()
        );
        Ok(records)
    }

    /// Normalize a raw frame into district records.
    ///
    /// Renames the source headers, fills missing approved-primary counts
    /// with zero, drops aggregate rows, derives totals and finally assigns
    /// cluster labels when enabled. Count cells that are present but not
    /// numeric fail the cast instead of being treated as missing.
    pub fn prepare_frame(
        df: DataFrame,
        options: &PrepareOptions,
    ) -> Result<Vec<DistrictRecord>, LoaderError> {
        let mut exprs: Vec<Expr> = ID_COLUMNS
            .iter()
            .map(|(source, name)| col(*source).cast(DataType::String).alias(*name))
            .collect();
        exprs.extend(
            COUNT_COLUMNS
                .iter()
                .map(|(source, name)| col(*source).strict_cast(DataType::Float64).alias(*name)),
        );

        let prepared = df
            .lazy()
            .select(exprs)
            .with_column(col(APPROVED_PRIMARY).fill_null(lit(0.0)))
            .collect()?;

        let province_ca = prepared.column(PROVINCE)?.str()?;
        let district_ca = prepared.column(DISTRICT)?.str()?;
        let counts: Vec<&Float64Chunked> = COUNT_COLUMNS
            .iter()
            .map(|(_, name)| prepared.column(name).and_then(|c| c.f64()))
            .collect::<PolarsResult<_>>()?;

        let mut records = Vec::with_capacity(prepared.height());
        let mut skipped = 0usize;

        for row in 0..prepared.height() {
            let province = text_at(province_ca, row, PROVINCE)?;
            let district = text_at(district_ca, row, DISTRICT)?;

            if is_sentinel(&province, &options.sentinel)
                || is_sentinel(&district, &options.sentinel)
            {
                skipped += 1;
                continue;
            }

            let mut values = [0.0; 6];
            for (i, (_, name)) in COUNT_COLUMNS.iter().enumerate() {
                values[i] = count_at(counts[i], row, name)?;
            }

            records.push(DistrictRecord::new(
                province,
                district,
                [values[0], values[1], values[2]],
                [values[3], values[4], values[5]],
            ));
        }

        if skipped > 0 {
            debug!("Dropped {} aggregate rows marked '{}'", skipped, options.sentinel);
        }

        Self::apply_clusters(&mut records, options.n_clusters);
        Ok(records)
    }

    /// Annotate records with k-means labels over `total_approved`.
    ///
    /// Clustering failures leave the labels unset; the dashboard then skips
    /// the scatter plot.
    pub fn apply_clusters(records: &mut [DistrictRecord], n_clusters: usize) {
        if n_clusters == 0 {
            return;
        }

        let totals: Vec<f64> = records.iter().map(|r| r.total_approved).collect();
        match clustering::assign_clusters(&totals, n_clusters) {
            Ok(labels) => {
                for (record, label) in records.iter_mut().zip(labels) {
                    record.cluster = Some(label);
                }
            }
            Err(e) => warn!("Skipping cluster labels: {}", e),
        }
    }

    /// Prepared rows of the cached file.
    pub fn records(&self) -> Option<&[DistrictRecord]> {
        self.cache.as_ref().map(|(_, records)| records.as_slice())
    }

    /// Set records directly (used for async loading)
    pub fn set_records(&mut self, file_path: PathBuf, records: Vec<DistrictRecord>) {
        self.cache = Some((file_path, records));
    }

    /// Drop the cached table.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}

fn text_at(ca: &StringChunked, row: usize, column: &str) -> Result<String, LoaderError> {
    ca.get(row)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| LoaderError::MissingValue {
            column: column.to_string(),
            row: row + 1,
        })
}

fn count_at(ca: &Float64Chunked, row: usize, column: &str) -> Result<f64, LoaderError> {
    ca.get(row)
        .filter(|v| !v.is_nan())
        .ok_or_else(|| LoaderError::MissingValue {
            column: column.to_string(),
            row: row + 1,
        })
}
