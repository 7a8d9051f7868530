//! Clustering Module
//! K-Means grouping of districts over the total approved posts feature.

use linfa::prelude::*;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use thiserror::Error;

/// Number of groups used by the dashboard scatter plot.
pub const DEFAULT_CLUSTERS: usize = 3;

/// Iteration cap handed to the k-means solver.
const MAX_ITERATIONS: u64 = 100;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Invalid clustering input: {0}")]
    Validation(String),
    #[error("K-Means clustering failed: {0}")]
    Model(String),
}

/// Assign a cluster index to every value.
///
/// Runs k-means over a single feature. Labels are renumbered so that
/// cluster `0` has the smallest centroid, `1` the next one, and so on,
/// which keeps colours stable between runs.
pub fn assign_clusters(values: &[f64], n_clusters: usize) -> Result<Vec<usize>, ClusterError> {
    if values.is_empty() {
        return Err(ClusterError::Validation("no values to cluster".to_string()));
    }

    if n_clusters == 0 {
        return Err(ClusterError::Validation("n_clusters must be > 0".to_string()));
    }

    if n_clusters > values.len() {
        return Err(ClusterError::Validation(format!(
            "n_clusters ({}) cannot exceed number of samples ({})",
            n_clusters,
            values.len()
        )));
    }

    if values.iter().any(|v| !v.is_finite()) {
        return Err(ClusterError::Validation(
            "values must be finite".to_string(),
        ));
    }

    let features = Array2::from_shape_vec((values.len(), 1), values.to_vec())
        .map_err(|e| ClusterError::Validation(e.to_string()))?;

    // Unit targets: linfa datasets always carry a target array
    let targets = Array1::from_elem(features.nrows(), ());
    let dataset = Dataset::new(features, targets);

    let model = KMeans::params(n_clusters)
        .max_n_iterations(MAX_ITERATIONS)
        .fit(&dataset)
        .map_err(|e| ClusterError::Model(e.to_string()))?;

    let raw_labels: Vec<usize> = model.predict(dataset.records()).into_iter().collect();

    let centroids: Vec<f64> = model.centroids().column(0).iter().copied().collect();
    let rank = centroid_ranks(&centroids);

    Ok(raw_labels
        .into_iter()
        .map(|label| rank.get(label).copied().unwrap_or(label))
        .collect())
}

/// Map each centroid index to its position in ascending centroid order.
fn centroid_ranks(centroids: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..centroids.len()).collect();
    order.sort_by(|&a, &b| {
        centroids[a]
            .partial_cmp(&centroids[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut rank = vec![0; centroids.len()];
    for (position, &idx) in order.iter().enumerate() {
        rank[idx] = position;
    }
    rank
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_clusters_separates_groups() {
        let values = [100.0, 110.0, 105.0, 900.0, 950.0, 2000.0, 2100.0];
        let labels = assign_clusters(&values, 3).unwrap();

        assert_eq!(labels.len(), values.len());
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[5], labels[6]);
        assert_ne!(labels[0], labels[3]);
        assert_ne!(labels[3], labels[5]);
    }

    #[test]
    fn test_labels_follow_centroid_order() {
        let values = [2000.0, 10.0, 500.0, 2010.0, 12.0, 505.0];
        let labels = assign_clusters(&values, 3).unwrap();

        assert_eq!(labels, vec![2, 0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_assign_clusters_rejects_bad_input() {
        assert!(assign_clusters(&[], 3).is_err());
        assert!(assign_clusters(&[1.0, 2.0], 0).is_err());
        assert!(assign_clusters(&[1.0, 2.0], 3).is_err());
        assert!(assign_clusters(&[1.0, f64::NAN, 3.0], 2).is_err());
    }

    #[test]
    fn test_centroid_ranks() {
        assert_eq!(centroid_ranks(&[5.0, 1.0, 3.0]), vec![2, 0, 1]);
        assert_eq!(centroid_ranks(&[]), Vec::<usize>::new());
    }
}
