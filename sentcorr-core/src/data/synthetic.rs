//! Synthetic prices for development and offline demos.
//!
//! A random walk from 100.0, one sample per timeframe step, seeded from the
//! symbol so the same request always yields the same series. Results built on
//! synthetic prices are tagged `DataSource::Synthetic` in the run manifest.

use super::provider::{clip_to_request, DataError, DataSource, FetchRequest, PriceProvider};
use crate::domain::{PricePoint, PriceSeries};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    start_price: f64,
    max_step: f64,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self {
            start_price: 100.0,
            max_step: 0.01,
        }
    }

    fn generate(&self, request: &FetchRequest) -> Vec<PricePoint> {
        let seed: [u8; 32] = *blake3::hash(request.symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let step = request.timeframe.duration();
        let mut points = Vec::new();
        let mut price = self.start_price;
        let mut current = request.start;

        while current <= request.end && points.len() < request.limit {
            points.push(PricePoint::new(current, price));
            let r: f64 = rng.gen_range(-self.max_step..self.max_step);
            price *= 1.0 + r;
            current += step;
        }

        points
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PriceSeries, DataError> {
        request.check()?;
        warn!(
            symbol = %request.symbol,
            "generating synthetic prices, results will be tagged as synthetic"
        );
        clip_to_request(self.generate(request), request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;
    use chrono::{TimeZone, Utc};

    fn request(symbol: &str, limit: usize) -> FetchRequest {
        FetchRequest {
            symbol: symbol.into(),
            timeframe: Timeframe::OneHour,
            start: Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 10, 12, 0, 0, 0).unwrap(),
            limit,
        }
    }

    #[test]
    fn hourly_samples_cover_range_inclusive() {
        let series = SyntheticProvider::new().fetch(&request("BTC/USDT", 1000)).unwrap();
        // 11 days of hours plus the closing endpoint
        assert_eq!(series.len(), 11 * 24 + 1);
        assert_eq!(series.points()[0].close, 100.0);
    }

    #[test]
    fn deterministic_per_symbol() {
        let a = SyntheticProvider::new().fetch(&request("BTC/USDT", 50)).unwrap();
        let b = SyntheticProvider::new().fetch(&request("BTC/USDT", 50)).unwrap();
        let c = SyntheticProvider::new().fetch(&request("ETH/USDT", 50)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.closes(), c.closes());
    }

    #[test]
    fn respects_limit() {
        let series = SyntheticProvider::new().fetch(&request("X", 10)).unwrap();
        assert_eq!(series.len(), 10);
    }

    #[test]
    fn prices_stay_positive() {
        let series = SyntheticProvider::new().fetch(&request("X", 1000)).unwrap();
        assert!(series.closes().iter().all(|&c| c > 0.0));
    }
}
