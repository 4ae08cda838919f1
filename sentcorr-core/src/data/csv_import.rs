//! Offline price import from CSV.
//!
//! Expects a header row with at least `timestamp` and `close` columns; other
//! columns (open, high, volume, ...) are ignored. Timestamps are RFC 3339
//! strings or epoch milliseconds. The request range and limit still apply.

use super::provider::{clip_to_request, DataError, DataSource, FetchRequest, PriceProvider};
use crate::domain::{PricePoint, PriceSeries};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    close: f64,
}

/// Reads a single-symbol price file from disk.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(ms) = raw.parse::<i64>() {
            return DateTime::from_timestamp_millis(ms);
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn read_points(&self) -> Result<Vec<PricePoint>, DataError> {
        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| DataError::Import(format!("{}: {e}", self.path.display())))?;

        let mut points = Vec::new();
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            // +2: one for the header, one for 1-based line numbers.
            let line = i + 2;
            let row = row.map_err(|e| DataError::Import(format!("line {line}: {e}")))?;
            let timestamp = Self::parse_timestamp(&row.timestamp).ok_or_else(|| {
                DataError::Import(format!("line {line}: bad timestamp '{}'", row.timestamp))
            })?;
            points.push(PricePoint::new(timestamp, row.close));
        }
        Ok(points)
    }
}

impl PriceProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvImport
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PriceSeries, DataError> {
        request.check()?;
        let points = self.read_points()?;
        let series = clip_to_request(points, request)?;
        info!(path = %self.path.display(), kept = series.len(), "imported prices");
        Ok(series)
    }
}
