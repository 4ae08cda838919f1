//! Binance spot klines provider.
//!
//! Fetches candles from the public `/api/v3/klines` endpoint (no API key) and
//! keeps the close of each candle, stamped with the candle open time.
//! Transport failures and 5xx responses are retried with exponential backoff;
//! rate limits and unknown symbols are returned immediately.

use super::provider::{clip_to_request, DataError, DataSource, FetchRequest, PriceProvider};
use crate::domain::{PricePoint, PriceSeries};
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance rejects larger pages.
const MAX_PAGE: usize = 1000;

/// Used when a 429/418 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Outcome of a single klines response.
#[derive(Debug)]
enum ResponseAction {
    Parse,
    Retry(DataError),
    Fail(DataError),
}

/// Error body returned alongside 4xx statuses.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

/// Binance spot market data provider.
pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at another host (e.g. a regional mirror).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("sentcorr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// `BTC/USDT`, `btc-usdt` and `BTCUSDT` all become `BTCUSDT`.
    pub fn exchange_symbol(symbol: &str) -> String {
        symbol
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase()
    }

    fn klines_url(&self, request: &FetchRequest) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&startTime={}&endTime={}&limit={}",
            self.base_url,
            Self::exchange_symbol(&request.symbol),
            request.timeframe,
            request.start.timestamp_millis(),
            request.end.timestamp_millis(),
            request.limit.min(MAX_PAGE),
        )
    }

    /// Parse a klines body: an array of arrays whose element 0 is the open
    /// time in ms and element 4 is the close as a decimal string.
    fn parse_klines(body: &str) -> Result<Vec<PricePoint>, DataError> {
        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(body)
            .map_err(|e| DataError::ResponseFormatChanged(format!("klines body: {e}")))?;

        let mut points = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let open_time = row.first().and_then(|v| v.as_i64()).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("row {i}: missing open time"))
            })?;
            let close = match row.get(4) {
                Some(serde_json::Value::String(s)) => s.parse::<f64>().ok(),
                Some(v) => v.as_f64(),
                None => None,
            }
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("row {i}: missing close")))?;
            let timestamp = DateTime::from_timestamp_millis(open_time).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("row {i}: invalid open time {open_time}"))
            })?;
            points.push(PricePoint::new(timestamp, close));
        }
        Ok(points)
    }

    fn classify_client_error(
        symbol: &str,
        status: reqwest::StatusCode,
        body: &str,
    ) -> DataError {
        match serde_json::from_str::<ApiError>(body) {
            // -1121: Invalid symbol.
            Ok(err) if err.code == -1121 => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Ok(err) => DataError::InvalidRequest(format!("{} ({}): {}", status, err.code, err.msg)),
            Err(_) => DataError::Other(format!("HTTP {status} for {symbol}")),
        }
    }

    /// Decide what to do with a response from its status, `Retry-After`
    /// header and body. Kept free of I/O so the mapping is testable.
    fn classify_response(
        symbol: &str,
        status: reqwest::StatusCode,
        retry_after: Option<&str>,
        body: &str,
    ) -> ResponseAction {
        // 418 follows repeated 429s: the IP is banned for a while.
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
            let retry_after_secs = retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return ResponseAction::Fail(DataError::RateLimited { retry_after_secs });
        }
        if status.is_server_error() {
            return ResponseAction::Retry(DataError::Other(format!("HTTP {status} for {symbol}")));
        }
        if !status.is_success() {
            return ResponseAction::Fail(Self::classify_client_error(symbol, status, body));
        }
        ResponseAction::Parse
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt.saturating_sub(1))
    }

    fn fetch_with_retry(&self, request: &FetchRequest) -> Result<Vec<PricePoint>, DataError> {
        let url = self.klines_url(request);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff_delay(attempt);
                debug!(attempt, ?delay, "retrying klines request");
                std::thread::sleep(delay);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!(error = %e, "klines request failed");
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let body = match resp.text() {
                Ok(body) => body,
                Err(e) if status.is_success() => {
                    return Err(DataError::ResponseFormatChanged(format!(
                        "unreadable body: {e}"
                    )))
                }
                Err(_) => String::new(),
            };

            match Self::classify_response(&request.symbol, status, retry_after.as_deref(), &body)
            {
                ResponseAction::Parse => return Self::parse_klines(&body),
                ResponseAction::Retry(err) => {
                    warn!(%status, "binance server error");
                    last_error = Some(err);
                }
                ResponseAction::Fail(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl PriceProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn source(&self) -> DataSource {
        DataSource::Binance
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PriceSeries, DataError> {
        request.check()?;
        // An empty page is a valid symbol with no candles in range; unknown
        // symbols come back as -1121.
        let points = self.fetch_with_retry(request)?;
        let raw = points.len();
        let series = clip_to_request(points, request)?;
        info!(
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            raw,
            kept = series.len(),
            "fetched klines"
        );
        Ok(series)
    }
}
