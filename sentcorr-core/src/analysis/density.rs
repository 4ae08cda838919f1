//! Density grid for the correlation heatmap.
//!
//! Rows are time buckets, one per correlation sample in order (index based,
//! so samples never share a row however close their timestamps are). Columns
//! are `n_bins` equal-width buckets over `[-1, 1]` with edges
//! `-1 + 2k / n_bins`. A value sitting exactly on an interior edge belongs to
//! the lower bucket; `-1.0` lands in bucket 0 and `1.0` in the last one.
//! Cells hold `ln(1 + count)`.

use crate::domain::CorrelationSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BINS: usize = 20;

/// Log-compressed 2D histogram of (time bucket, correlation bucket).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityGrid {
    n_bins: usize,
    time_labels: Vec<DateTime<Utc>>,
    counts: Vec<Vec<u32>>,
    values: Vec<Vec<f64>>,
    skipped: usize,
}

impl DensityGrid {
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Number of time buckets (rows).
    pub fn time_buckets(&self) -> usize {
        self.values.len()
    }

    /// No rows: the correlation view has nothing to show.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Log-compressed cell values, `values[time][corr]`.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Raw counts before `ln(1 + x)`, same shape as `values`.
    pub fn counts(&self) -> &[Vec<u32>] {
        &self.counts
    }

    pub fn value(&self, time_bucket: usize, corr_bucket: usize) -> Option<f64> {
        self.values.get(time_bucket)?.get(corr_bucket).copied()
    }

    /// Sum of raw counts across the grid.
    pub fn total_count(&self) -> u64 {
        self.counts
            .iter()
            .flat_map(|row| row.iter())
            .map(|&c| u64::from(c))
            .sum()
    }

    /// Samples that could not be placed (non-finite or outside `[-1, 1]`).
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Timestamp of each time bucket.
    pub fn time_labels(&self) -> &[DateTime<Utc>] {
        &self.time_labels
    }

    /// Bucket midpoints, for axis labels only.
    pub fn corr_labels(&self) -> Vec<f64> {
        let edges = bucket_edges(self.n_bins);
        edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Correlation-major copy, `z[corr][time]`, as heatmap renderers expect.
    pub fn to_corr_major(&self) -> Vec<Vec<f64>> {
        (0..self.n_bins)
            .map(|b| self.values.iter().map(|row| row[b]).collect())
            .collect()
    }
}

/// `n_bins + 1` evenly spaced edges from -1 to 1 inclusive.
pub fn bucket_edges(n_bins: usize) -> Vec<f64> {
    let n = n_bins.max(1);
    (0..=n)
        .map(|k| -1.0 + 2.0 * k as f64 / n as f64)
        .collect()
}

/// Bucket index for `corr`, or `None` if it cannot be placed.
pub fn corr_bucket(corr: f64, n_bins: usize) -> Option<usize> {
    if !corr.is_finite() || !(-1.0..=1.0).contains(&corr) {
        return None;
    }
    let n = n_bins.max(1);
    let edges = bucket_edges(n);
    // First bucket whose upper edge is >= corr. The last edge is exactly 1.0,
    // so an in-range value always finds one.
    edges[1..].iter().position(|&upper| corr <= upper).or(Some(n - 1))
}

/// Bin a correlation series into a log-density grid.
///
/// An empty series produces an empty grid rather than an error.
pub fn bin_density(corr: &CorrelationSeries, n_bins: usize) -> DensityGrid {
    let n = n_bins.max(1);
    let rows = corr.len();

    let mut counts = vec![vec![0u32; n]; rows];
    let mut skipped = 0;
    for (row, point) in corr.points().iter().enumerate() {
        match corr_bucket(point.corr, n) {
            Some(b) => counts[row][b] += 1,
            None => skipped += 1,
        }
    }

    let values = counts
        .iter()
        .map(|row| row.iter().map(|&c| f64::from(c).ln_1p()).collect())
        .collect();

    debug!(rows, n_bins = n, skipped, "binned correlation density");

    DensityGrid {
        n_bins: n,
        time_labels: corr.timestamps(),
        counts,
        values,
        skipped,
    }
}
