//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over price sources (Binance klines, CSV
//! import, synthetic walk) so the pipeline never depends on a particular
//! exchange and tests can substitute a mock.

use crate::domain::{PricePoint, PriceSeries, SeriesError, Symbol, Timeframe};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to fetch: one symbol, one timeframe, a closed time range, a sample cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: usize,
}

/// Structured error types for acquisition.
///
/// The pipeline forwards these unmodified; only the driver renders them.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("price import failed: {0}")]
    Import(String),

    #[error("validation error: {0}")]
    Validation(#[from] SeriesError),

    #[error("data error: {0}")]
    Other(String),
}

/// Where the prices came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Binance,
    CsvImport,
    Synthetic,
}

/// Trait for price providers.
///
/// Implementations return a series clipped to `[start, end]`, ascending, with
/// at most `limit` samples. Any retry policy is the provider's own business.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Tag recorded in run manifests.
    fn source(&self) -> DataSource;

    /// Fetch close prices for the request.
    fn fetch(&self, request: &FetchRequest) -> Result<PriceSeries, DataError>;
}

impl FetchRequest {
    /// Reject requests no provider could satisfy.
    pub fn check(&self) -> Result<(), DataError> {
        if self.symbol.trim().is_empty() {
            return Err(DataError::InvalidRequest("symbol is empty".into()));
        }
        if self.start >= self.end {
            return Err(DataError::InvalidRequest(format!(
                "start {} is not before end {}",
                self.start, self.end
            )));
        }
        if self.limit == 0 {
            return Err(DataError::InvalidRequest("limit must be at least 1".into()));
        }
        Ok(())
    }
}

/// Sort, drop duplicate timestamps (first wins), clip to the request range,
/// cap at the request limit, and validate into a `PriceSeries`.
pub fn clip_to_request(
    mut points: Vec<PricePoint>,
    request: &FetchRequest,
) -> Result<PriceSeries, DataError> {
    points.sort_by_key(|p| p.timestamp);
    points.dedup_by_key(|p| p.timestamp);
    points.retain(|p| p.timestamp >= request.start && p.timestamp <= request.end);
    points.truncate(request.limit);
    Ok(PriceSeries::new(request.symbol.clone(), points)?)
}
