//! Rolling Pearson correlation between price and sentiment.
//!
//! For every index `i >= window - 1` the correlation of
//! `prices[i-window+1..=i]` against `sentiment[i-window+1..=i]` is emitted,
//! stamped with the timestamp at `i`. Windows where either side has zero
//! variance have no defined correlation and are dropped, so the output never
//! carries NaN.

use crate::domain::{CorrelationPoint, CorrelationSeries, PriceSeries, SentimentSeries};
use thiserror::Error;
use tracing::debug;

/// One trading day of hourly candles.
pub const DEFAULT_WINDOW: usize = 24;

/// Caller errors: the two inputs must describe the same timeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorrelationError {
    #[error("price series has {prices} samples but sentiment has {sentiment}")]
    LengthMismatch { prices: usize, sentiment: usize },

    #[error("timestamps diverge at index {index}")]
    TimestampMismatch { index: usize },

    #[error("window must be at least 2, got {0}")]
    InvalidWindow(usize),
}

/// Rolling correlation over `window` consecutive samples.
///
/// Returns an empty series (not an error) when `window` exceeds the series
/// length or every window is degenerate.
pub fn correlate(
    prices: &PriceSeries,
    sentiment: &SentimentSeries,
    window: usize,
) -> Result<CorrelationSeries, CorrelationError> {
    if window < 2 {
        return Err(CorrelationError::InvalidWindow(window));
    }
    if prices.len() != sentiment.len() {
        return Err(CorrelationError::LengthMismatch {
            prices: prices.len(),
            sentiment: sentiment.len(),
        });
    }
    if let Some(index) = prices
        .points()
        .iter()
        .zip(sentiment.points())
        .position(|(p, s)| p.timestamp != s.timestamp)
    {
        return Err(CorrelationError::TimestampMismatch { index });
    }

    let n = prices.len();
    if n < window {
        debug!(n, window, "series shorter than correlation window");
        return Ok(CorrelationSeries::with_degenerate(window, 0, Vec::new()));
    }

    let xs = prices.closes();
    let ys = sentiment.values();
    let mut points = Vec::with_capacity(n - window + 1);
    let mut degenerate = 0;

    for end in (window - 1)..n {
        let start = end + 1 - window;
        match pearson(&xs[start..=end], &ys[start..=end]) {
            Some(corr) => points.push(CorrelationPoint {
                timestamp: prices.points()[end].timestamp,
                corr,
            }),
            None => degenerate += 1,
        }
    }

    debug!(emitted = points.len(), degenerate, window, "rolling correlation");
    Ok(CorrelationSeries::with_degenerate(window, degenerate, points))
}

/// Pearson correlation of two equal-length slices.
///
/// `None` when the slices are shorter than 2, differ in length, or either has
/// zero variance. The result is clamped to `[-1, 1]` against rounding drift.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }
    // A constant slice can still pick up a nonzero variance from the rounded
    // mean (e.g. 24 × 60000.02), so test for it directly.
    if is_constant(xs) || is_constant(ys) {
        return None;
    }

    let nf = n as f64;
    let mean_x = xs.iter().sum::<f64>() / nf;
    let mean_y = ys.iter().sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|&v| v == values[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sentiment::derive;
    use crate::analysis::test_support::{assert_approx, series_from, DEFAULT_EPSILON};

    #[test]
    fn pearson_perfect_positive() {
        let r = pearson(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert_approx(r, 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn pearson_perfect_negative() {
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert_approx(r, -1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn pearson_hand_computed() {
        // x = [1,2,3,4,5], y = [2,1,4,3,5]
        // dx = [-2,-1,0,1,2], dy = [-1,-2,1,0,2]
        // cov = 2+2+0+0+4 = 8, var_x = 10, var_y = 10 -> r = 0.8
        let r = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 1.0, 4.0, 3.0, 5.0]).unwrap();
        assert_approx(r, 0.8, DEFAULT_EPSILON);
    }

    #[test]
    fn pearson_zero_variance_is_undefined() {
        assert_eq!(pearson(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0]), None);
    }

    #[test]
    fn pearson_rejects_short_or_mismatched() {
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn output_length_and_alignment() {
        let prices = series_from(&[100.0, 101.0, 99.5, 102.0, 103.0, 101.0, 104.0]);
        let sentiment = derive(&prices);
        let corr = correlate(&prices, &sentiment, 3).unwrap();

        assert!(corr.len() <= prices.len() - 3 + 1);
        assert_eq!(corr.len() + corr.degenerate_windows(), prices.len() - 3 + 1);
        // Every emitted point is stamped with the last timestamp of its window.
        let stamps = prices.timestamps();
        for p in corr.points() {
            assert!(stamps[2..].contains(&p.timestamp));
            assert!((-1.0..=1.0).contains(&p.corr));
        }
    }

    #[test]
    fn first_emitted_point_matches_direct_computation() {
        let prices = series_from(&[100.0, 102.0, 101.0, 105.0, 104.0]);
        let sentiment = derive(&prices);
        let corr = correlate(&prices, &sentiment, 4).unwrap();

        let expected = pearson(&prices.closes()[0..4], &sentiment.values()[0..4]).unwrap();
        assert_eq!(corr.points()[0].corr, expected);
        assert_eq!(corr.points()[0].timestamp, prices.points()[3].timestamp);
        assert_eq!(corr.len(), 2);
    }

    #[test]
    fn constant_price_windows_are_dropped() {
        let mut closes = vec![100.0; 10];
        closes.extend([101.0, 103.0, 102.0]);
        let prices = series_from(&closes);
        let sentiment = derive(&prices);
        let corr = correlate(&prices, &sentiment, 4).unwrap();

        // Windows ending at indices 3..=9 are entirely flat.
        assert_eq!(corr.degenerate_windows(), 7);
        assert_eq!(corr.len(), 3);
        assert!(corr.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn flat_windows_at_fractional_prices_are_dropped() {
        for k in 1..2000 {
            let c = 60_000.0 + k as f64 * 0.01;
            let mut closes = vec![0.97 * c];
            closes.extend(std::iter::repeat(c).take(24));
            let prices = series_from(&closes);
            let sentiment = derive(&prices);
            let corr = correlate(&prices, &sentiment, DEFAULT_WINDOW).unwrap();

            // Window ending at index 23 sees the jump; the one ending at 24 is flat.
            assert_eq!(corr.degenerate_windows(), 1, "c = {c}");
            assert_eq!(corr.len(), 1, "c = {c}");
            assert_eq!(corr.points()[0].timestamp, prices.points()[23].timestamp);
        }
    }

    #[test]
    fn pearson_constant_fractional_slice_is_undefined() {
        let xs = vec![60_000.02; 24];
        let ys: Vec<f64> = (0..24).map(|i| i as f64 * 0.1).collect();
        assert_eq!(pearson(&xs, &ys), None);
    }

    #[test]
    fn window_longer_than_series_is_empty() {
        let prices = series_from(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        let sentiment = derive(&prices);
        let corr = correlate(&prices, &sentiment, DEFAULT_WINDOW).unwrap();
        assert!(corr.is_empty());
        assert_eq!(corr.window(), 24);
    }

    #[test]
    fn length_mismatch_fails_fast() {
        let prices = series_from(&[1.0, 2.0, 3.0]);
        let other = series_from(&[1.0, 2.0]);
        let err = correlate(&prices, &derive(&other), 2).unwrap_err();
        assert_eq!(
            err,
            CorrelationError::LengthMismatch {
                prices: 3,
                sentiment: 2
            }
        );
    }

    #[test]
    fn timestamp_mismatch_fails_fast() {
        use crate::domain::{PricePoint, PriceSeries};
        let prices = series_from(&[1.0, 2.0, 3.0]);
        let shifted: Vec<PricePoint> = prices
            .points()
            .iter()
            .map(|p| PricePoint::new(p.timestamp + chrono::Duration::minutes(1), p.close))
            .collect();
        let shifted = PriceSeries::new("TEST", shifted).unwrap();
        let err = correlate(&prices, &derive(&shifted), 2).unwrap_err();
        assert_eq!(err, CorrelationError::TimestampMismatch { index: 0 });
    }

    #[test]
    fn window_below_two_is_rejected() {
        let prices = series_from(&[1.0, 2.0, 3.0]);
        let sentiment = derive(&prices);
        assert_eq!(
            correlate(&prices, &sentiment, 1).unwrap_err(),
            CorrelationError::InvalidWindow(1)
        );
    }
}
