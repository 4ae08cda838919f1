//! One pipeline run: acquire → derive → correlate → bin → normalize.
//!
//! Acquisition is the only step that can fail for reasons outside the
//! caller's control; its error is forwarded untouched and never retried here.
//! Thin data and flat prices are not errors: they come back as
//! [`Diagnostic`]s next to (possibly empty) outputs so a renderer can show an
//! "insufficient data" state.

use crate::analysis::{
    bin_density, correlate, derive_with_scale, normalize, CorrelationError, DensityGrid,
    NormalizedSeries, DEFAULT_BINS, DEFAULT_SENTIMENT_SCALE, DEFAULT_WINDOW,
};
use crate::data::{DataError, DataSource, FetchRequest, PriceProvider};
use crate::domain::{CorrelationSeries, PriceSeries, SentimentSeries};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("acquisition failed: {0}")]
    Acquisition(#[from] DataError),

    #[error("precondition violated: {0}")]
    Precondition(#[from] CorrelationError),
}

/// Tunables for the analysis steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    pub window: usize,
    pub n_bins: usize,
    pub sentiment_scale: f64,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            n_bins: DEFAULT_BINS,
            sentiment_scale: DEFAULT_SENTIMENT_SCALE,
        }
    }
}

/// Non-fatal conditions a renderer should surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No correlation could be computed: too few samples or every window flat.
    InsufficientData { samples: usize, window: usize },
    /// Some windows were flat and left out of the correlation series.
    DegenerateWindows { dropped: usize, window: usize },
    /// The price series has zero range; the normalized view is all zeros.
    DegenerateRange { samples: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InsufficientData { samples, window } => write!(
                f,
                "insufficient data for correlation view ({samples} samples, window {window})"
            ),
            Diagnostic::DegenerateWindows { dropped, window } => write!(
                f,
                "{dropped} correlation windows of {window} had zero variance and were dropped"
            ),
            Diagnostic::DegenerateRange { samples } => write!(
                f,
                "flat price series over {samples} samples, normalized price shown as zero"
            ),
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub prices: PriceSeries,
    pub sentiment: SentimentSeries,
    pub normalized: NormalizedSeries,
    pub correlation: CorrelationSeries,
    pub density: DensityGrid,
    pub diagnostics: Vec<Diagnostic>,
    pub params: PipelineParams,
    /// BLAKE3 of the input prices, see [`PriceSeries::content_hash`].
    pub dataset_hash: String,
    /// `None` when the prices were handed in directly.
    pub source: Option<DataSource>,
}

impl PipelineOutput {
    pub fn insufficient_data(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::InsufficientData { .. }))
    }

    pub fn degenerate_range(&self) -> bool {
        self.normalized.degenerate_range
    }
}

/// Fetch prices from `provider` and analyze them.
pub fn run(
    provider: &dyn PriceProvider,
    request: &FetchRequest,
    params: &PipelineParams,
) -> Result<PipelineOutput, PipelineError> {
    info!(
        provider = provider.name(),
        symbol = %request.symbol,
        timeframe = %request.timeframe,
        start = %request.start,
        end = %request.end,
        "acquiring prices"
    );
    let prices = provider.fetch(request)?;
    let mut output = analyze(prices, params)?;
    output.source = Some(provider.source());
    Ok(output)
}

/// Analyze an already acquired price series.
pub fn analyze(
    prices: PriceSeries,
    params: &PipelineParams,
) -> Result<PipelineOutput, PipelineError> {
    let sentiment = derive_with_scale(&prices, params.sentiment_scale);
    let correlation = correlate(&prices, &sentiment, params.window)?;
    let density = bin_density(&correlation, params.n_bins);
    let normalized = normalize(&prices);

    debug!(
        samples = prices.len(),
        correlations = correlation.len(),
        time_buckets = density.time_buckets(),
        "analysis complete"
    );

    let mut diagnostics = Vec::new();
    if correlation.is_empty() {
        warn!(
            samples = prices.len(),
            window = params.window,
            "insufficient data for correlation view"
        );
        diagnostics.push(Diagnostic::InsufficientData {
            samples: prices.len(),
            window: params.window,
        });
    }
    if correlation.degenerate_windows() > 0 {
        warn!(
            dropped = correlation.degenerate_windows(),
            "dropped zero-variance correlation windows"
        );
        diagnostics.push(Diagnostic::DegenerateWindows {
            dropped: correlation.degenerate_windows(),
            window: params.window,
        });
    }
    if normalized.degenerate_range {
        diagnostics.push(Diagnostic::DegenerateRange {
            samples: prices.len(),
        });
    }

    let dataset_hash = prices.content_hash();

    Ok(PipelineOutput {
        prices,
        sentiment,
        normalized,
        correlation,
        density,
        diagnostics,
        params: *params,
        dataset_hash,
        source: None,
    })
}
