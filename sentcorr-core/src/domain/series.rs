//! Time series produced and consumed by one pipeline run.
//!
//! All series are immutable once built. `PriceSeries` is validated on
//! construction (strictly increasing timestamps, finite closes); the derived
//! series are only built by the analysis functions, which preserve alignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single close-price sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Reasons a sequence of samples cannot form a `PriceSeries`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("timestamp at index {index} is not after its predecessor")]
    NonIncreasingTimestamp { index: usize },

    #[error("close at index {index} is not finite: {value}")]
    NonFiniteClose { index: usize, value: f64 },
}

/// Ordered close prices for one symbol.
///
/// Deserialization goes through [`PriceSeries::new`], so a loaded series is
/// held to the same checks as a constructed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceSeries")]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

#[derive(Deserialize)]
struct RawPriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl TryFrom<RawPriceSeries> for PriceSeries {
    type Error = SeriesError;

    fn try_from(raw: RawPriceSeries) -> Result<Self, Self::Error> {
        PriceSeries::new(raw.symbol, raw.points)
    }
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order timestamps and non-finite closes.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for (i, p) in points.iter().enumerate() {
            if !p.close.is_finite() {
                return Err(SeriesError::NonFiniteClose {
                    index: i,
                    value: p.close,
                });
            }
            if i > 0 && p.timestamp <= points[i - 1].timestamp {
                return Err(SeriesError::NonIncreasingTimestamp { index: i });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// BLAKE3 digest over symbol, timestamps and close bits.
    ///
    /// Two runs over series with the same hash see bit-identical input.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for p in &self.points {
            hasher.update(&p.timestamp.timestamp_millis().to_le_bytes());
            hasher.update(&p.close.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// A single sentiment sample in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Sentiment aligned one-to-one with the price series it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSeries {
    points: Vec<SentimentPoint>,
}

impl SentimentSeries {
    pub(crate) fn from_points(points: Vec<SentimentPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[SentimentPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Correlation of the window ending at `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPoint {
    pub timestamp: DateTime<Utc>,
    pub corr: f64,
}

/// Rolling correlation with undefined windows already dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSeries {
    window: usize,
    degenerate_windows: usize,
    points: Vec<CorrelationPoint>,
}

impl CorrelationSeries {
    /// Wrap precomputed points. The correlator is the usual producer; this is
    /// public so a renderer or test can bin an externally supplied series.
    pub fn from_points(window: usize, points: Vec<CorrelationPoint>) -> Self {
        Self {
            window,
            degenerate_windows: 0,
            points,
        }
    }

    pub(crate) fn with_degenerate(
        window: usize,
        degenerate_windows: usize,
        points: Vec<CorrelationPoint>,
    ) -> Self {
        Self {
            window,
            degenerate_windows,
            points,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of full windows dropped because one side had zero variance.
    pub fn degenerate_windows(&self) -> usize {
        self.degenerate_windows
    }

    pub fn points(&self) -> &[CorrelationPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.corr).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Arithmetic mean of the emitted correlations, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let sum: f64 = self.points.iter().map(|p| p.corr).sum();
        Some(sum / self.points.len() as f64)
    }
}
