//! Min-max normalization for the overlaid time-series view.

use crate::domain::PriceSeries;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Closes scaled into `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSeries {
    pub values: Vec<f64>,
    /// Set when every close was equal; `values` is then all zero.
    pub degenerate_range: bool,
}

/// `(p - min) / (max - min)`. A flat series maps to all zeros instead of
/// dividing by zero.
pub fn normalize(prices: &PriceSeries) -> NormalizedSeries {
    let closes = prices.closes();
    if closes.is_empty() {
        return NormalizedSeries {
            values: Vec::new(),
            degenerate_range: false,
        };
    }

    let min = closes.iter().copied().fold(f64::INFINITY, f64::min);
    let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range <= 0.0 || !range.is_finite() {
        warn!(
            symbol = prices.symbol(),
            samples = closes.len(),
            close = min,
            "flat price series, normalized view is all zeros"
        );
        return NormalizedSeries {
            values: vec![0.0; closes.len()],
            degenerate_range: true,
        };
    }

    NormalizedSeries {
        values: closes.iter().map(|&p| (p - min) / range).collect(),
        degenerate_range: false,
    }
}
