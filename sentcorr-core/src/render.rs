//! Renderer-facing views of a pipeline run.
//!
//! These are plain data: no colors, fonts or layout. A chart backend turns
//! `TimeSeriesView` into the dual-axis price/sentiment plot and `HeatmapView`
//! into the correlation density heatmap.

use crate::pipeline::PipelineOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized price and sentiment on a shared time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesView {
    pub symbol: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub close: Vec<f64>,
    pub normalized_price: Vec<f64>,
    pub sentiment: Vec<f64>,
    pub degenerate_range: bool,
}

impl TimeSeriesView {
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self {
            symbol: output.prices.symbol().to_string(),
            timestamps: output.prices.timestamps(),
            close: output.prices.closes(),
            normalized_price: output.normalized.values.clone(),
            sentiment: output.sentiment.values(),
            degenerate_range: output.normalized.degenerate_range,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Log-density heatmap, `z[corr_bucket][time_bucket]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapView {
    pub symbol: String,
    pub window: usize,
    pub time_labels: Vec<DateTime<Utc>>,
    pub corr_labels: Vec<f64>,
    pub z: Vec<Vec<f64>>,
    pub insufficient_data: bool,
}

impl HeatmapView {
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self {
            symbol: output.prices.symbol().to_string(),
            window: output.correlation.window(),
            time_labels: output.density.time_labels().to_vec(),
            corr_labels: output.density.corr_labels(),
            z: output.density.to_corr_major(),
            insufficient_data: output.insufficient_data(),
        }
    }

    /// Largest cell value, used to scale a color bar. Zero when empty.
    pub fn max_value(&self) -> f64 {
        self.z
            .iter()
            .flat_map(|row| row.iter().copied())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::series_from;
    use crate::pipeline::{analyze, PipelineParams};

    fn output(n: usize) -> PipelineOutput {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.7).cos() * 3.0).collect();
        analyze(series_from(&closes), &PipelineParams::default()).unwrap()
    }

    #[test]
    fn timeseries_view_is_aligned() {
        let out = output(48);
        let view = TimeSeriesView::from_output(&out);
        assert_eq!(view.len(), 48);
        assert_eq!(view.normalized_price.len(), 48);
        assert_eq!(view.sentiment.len(), 48);
        assert_eq!(view.close.len(), 48);
        assert_eq!(view.symbol, "TEST");
        assert!(!view.degenerate_range);
    }

    #[test]
    fn heatmap_view_shape() {
        let out = output(48);
        let view = HeatmapView::from_output(&out);
        assert_eq!(view.z.len(), 20);
        assert_eq!(view.corr_labels.len(), 20);
        for row in &view.z {
            assert_eq!(row.len(), view.time_labels.len());
        }
        assert_eq!(view.time_labels.len(), out.correlation.len());
        assert!(!view.insufficient_data);
        assert!(view.max_value() > 0.0);
    }

    #[test]
    fn heatmap_view_flags_insufficient_data() {
        let view = HeatmapView::from_output(&output(5));
        assert!(view.insufficient_data);
        assert!(view.time_labels.is_empty());
        assert_eq!(view.max_value(), 0.0);
    }
}
