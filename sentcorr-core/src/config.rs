//! Serializable run configuration.
//!
//! Loaded from TOML; every field has a default so an empty file (or no file)
//! reproduces the reference run: BTC/USDT hourly candles from 2024-10-01 to
//! 2024-10-12, 24-sample windows, 20 correlation buckets.

use crate::data::FetchRequest;
use crate::domain::Timeframe;
use crate::pipeline::PipelineParams;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 2024-10-01T00:00:00Z
const REFERENCE_START: i64 = 1_727_740_800;
/// 2024-10-12T00:00:00Z
const REFERENCE_END: i64 = 1_728_691_200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub analysis: AnalysisConfig,
}

/// `[data]`: what to acquire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            symbol: "BTC/USDT".into(),
            timeframe: Timeframe::OneHour,
            start: DateTime::UNIX_EPOCH + Duration::seconds(REFERENCE_START),
            end: DateTime::UNIX_EPOCH + Duration::seconds(REFERENCE_END),
            limit: 1000,
        }
    }
}

/// `[analysis]`: pipeline tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub window: usize,
    pub n_bins: usize,
    pub sentiment_scale: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let p = PipelineParams::default();
        Self {
            window: p.window,
            n_bins: p.n_bins,
            sentiment_scale: p.sentiment_scale,
        }
    }
}

impl AppConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("data.symbol is empty".into()));
        }
        if self.data.start >= self.data.end {
            return Err(ConfigError::Invalid(format!(
                "data.start ({}) must be before data.end ({})",
                self.data.start, self.data.end
            )));
        }
        if self.data.limit == 0 {
            return Err(ConfigError::Invalid("data.limit must be at least 1".into()));
        }
        if self.analysis.window < 2 {
            return Err(ConfigError::Invalid(format!(
                "analysis.window must be at least 2, got {}",
                self.analysis.window
            )));
        }
        if self.analysis.n_bins == 0 {
            return Err(ConfigError::Invalid("analysis.n_bins must be at least 1".into()));
        }
        if !(self.analysis.sentiment_scale.is_finite() && self.analysis.sentiment_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "analysis.sentiment_scale must be positive, got {}",
                self.analysis.sentiment_scale
            )));
        }
        Ok(())
    }

    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest {
            symbol: self.data.symbol.clone(),
            timeframe: self.data.timeframe,
            start: self.data.start,
            end: self.data.end,
            limit: self.data.limit,
        }
    }

    pub fn pipeline_params(&self) -> PipelineParams {
        PipelineParams {
            window: self.analysis.window,
            n_bins: self.analysis.n_bins,
            sentiment_scale: self.analysis.sentiment_scale,
        }
    }
}
