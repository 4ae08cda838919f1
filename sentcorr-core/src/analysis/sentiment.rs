//! Synthetic sentiment derived from price returns.
//!
//! `value[i] = tanh(k * (p[i] - p[i-1]) / p[i-1])`, with the first sample
//! pinned to zero change. `tanh` keeps every value inside `(-1, 1)` and is
//! close to linear for small returns: a 1% move with `k = 10` gives ~0.0997.

use crate::domain::{PriceSeries, SentimentPoint, SentimentSeries};

/// Scale applied to returns before squashing.
pub const DEFAULT_SENTIMENT_SCALE: f64 = 10.0;

/// Derive sentiment with the default scale.
pub fn derive(prices: &PriceSeries) -> SentimentSeries {
    derive_with_scale(prices, DEFAULT_SENTIMENT_SCALE)
}

/// Derive sentiment with an explicit scale `k`.
pub fn derive_with_scale(prices: &PriceSeries, scale: f64) -> SentimentSeries {
    let points = prices.points();
    let derived = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let ret = if i == 0 {
                0.0
            } else {
                pct_change(points[i - 1].close, p.close)
            };
            SentimentPoint {
                timestamp: p.timestamp,
                value: (scale * ret).tanh(),
            }
        })
        .collect();
    SentimentSeries::from_points(derived)
}

/// Simple return; a zero predecessor counts as no change.
pub fn pct_change(prev: f64, curr: f64) -> f64 {
    let r = (curr - prev) / prev;
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{assert_approx, series_from, DEFAULT_EPSILON};

    #[test]
    fn reference_scenario() {
        let prices = series_from(&[100.0, 110.0, 99.0, 99.0, 120.0]);
        let s = derive(&prices).values();

        assert_eq!(s.len(), 5);
        assert_eq!(s[0], 0.0);
        assert_approx(s[1], 1.0_f64.tanh(), DEFAULT_EPSILON);
        assert_approx(s[2], (-1.0_f64).tanh(), DEFAULT_EPSILON);
        assert_eq!(s[3], 0.0);
        // (120 - 99) / 99 * 10 = 2.1212...
        assert_approx(s[4], (210.0_f64 / 99.0).tanh(), DEFAULT_EPSILON);
    }

    #[test]
    fn one_percent_move() {
        let prices = series_from(&[100.0, 101.0]);
        let s = derive(&prices).values();
        assert_approx(s[1], 0.1_f64.tanh(), 1e-12);
        assert!((s[1] - 0.0997).abs() < 1e-4);
    }

    #[test]
    fn timestamps_are_aligned() {
        let prices = series_from(&[1.0, 2.0, 3.0]);
        let s = derive(&prices);
        for (p, q) in prices.points().iter().zip(s.points()) {
            assert_eq!(p.timestamp, q.timestamp);
        }
    }

    #[test]
    fn huge_moves_stay_bounded() {
        let prices = series_from(&[1.0, 1_000.0, 0.001]);
        let s = derive(&prices).values();
        assert!(s.iter().all(|v| v.abs() <= 1.0 && v.is_finite()));
        assert!(s[1] > 0.0);
        assert!(s[2] < 0.0);
    }

    #[test]
    fn zero_predecessor_is_zero_change() {
        let prices = series_from(&[0.0, 5.0]);
        assert_eq!(derive(&prices).values(), vec![0.0, 0.0]);
    }

    #[test]
    fn custom_scale() {
        let prices = series_from(&[100.0, 110.0]);
        let s = derive_with_scale(&prices, 1.0).values();
        assert_approx(s[1], 0.1_f64.tanh(), DEFAULT_EPSILON);
    }

    #[test]
    fn empty_series() {
        let prices = series_from(&[]);
        assert!(derive(&prices).is_empty());
    }
}
