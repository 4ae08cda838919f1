//! Artifact export for renderers: CSV time series, JSON heatmap, run manifest.
//!
//! Every run directory carries a `manifest.json` with a `schema_version`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sentcorr_core::data::DataSource;
use sentcorr_core::{AppConfig, Diagnostic, HeatmapView, PipelineOutput, PipelineParams, TimeSeriesView};

pub const SCHEMA_VERSION: u32 = 1;

/// Summary of one run, written next to the data files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub symbol: String,
    pub timeframe: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub source: Option<DataSource>,
    pub params: PipelineParams,
    pub dataset_hash: String,
    pub price_samples: usize,
    pub correlation_samples: usize,
    pub degenerate_windows: usize,
    pub mean_correlation: Option<f64>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunManifest {
    pub fn new(output: &PipelineOutput, config: &AppConfig) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            symbol: output.prices.symbol().to_string(),
            timeframe: config.data.timeframe.to_string(),
            start: config.data.start,
            end: config.data.end,
            source: output.source,
            params: output.params,
            dataset_hash: output.dataset_hash.clone(),
            price_samples: output.prices.len(),
            correlation_samples: output.correlation.len(),
            degenerate_windows: output.correlation.degenerate_windows(),
            mean_correlation: output.correlation.mean(),
            diagnostics: output.diagnostics.clone(),
        }
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: timestamp, close, normalized_price, sentiment
pub fn export_timeseries_csv(view: &TimeSeriesView) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "close", "normalized_price", "sentiment"])?;

    for i in 0..view.len() {
        wtr.write_record([
            &view.timestamps[i].to_rfc3339(),
            &format!("{:.8}", view.close[i]),
            &format!("{:.8}", view.normalized_price[i]),
            &format!("{:.8}", view.sentiment[i]),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_heatmap_json(view: &HeatmapView) -> Result<String> {
    serde_json::to_string_pretty(view).context("failed to serialize heatmap to JSON")
}

pub fn export_manifest_json(manifest: &RunManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize run manifest to JSON")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `timeseries.csv`, `heatmap.json` and `manifest.json` into a new
/// `{symbol}_{timestamp}/` directory under `output_dir`.
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    output: &PipelineOutput,
    config: &AppConfig,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        dir_safe(output.prices.symbol()),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(
        &run_dir.join("timeseries.csv"),
        &export_timeseries_csv(&TimeSeriesView::from_output(output))?,
    )?;
    write(
        &run_dir.join("heatmap.json"),
        &export_heatmap_json(&HeatmapView::from_output(output))?,
    )?;
    write(
        &run_dir.join("manifest.json"),
        &export_manifest_json(&RunManifest::new(output, config))?,
    )?;

    Ok(run_dir)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// `BTC/USDT` -> `BTC-USDT`
fn dir_safe(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sentcorr_core::analyze;
    use sentcorr_core::domain::{PricePoint, PriceSeries};

    fn sample_output(n: usize) -> PipelineOutput {
        let t0 = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        let points = (0..n)
            .map(|i| {
                let close = 62_000.0 + (i as f64 * 0.3).sin() * 500.0 + (i % 5) as f64 * 20.0;
                PricePoint::new(t0 + Duration::hours(i as i64), close)
            })
            .collect();
        let prices = PriceSeries::new("BTC/USDT", points).unwrap();
        analyze(prices, &PipelineParams::default()).unwrap()
    }

    #[test]
    fn timeseries_csv_has_header_and_one_row_per_sample() {
        let out = sample_output(40);
        let csv = export_timeseries_csv(&TimeSeriesView::from_output(&out)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "timestamp,close,normalized_price,sentiment");
        assert_eq!(lines.len(), 41);
        assert!(lines[1].starts_with("2024-10-01T00:00:00+00:00,"));
        assert!(lines[1].ends_with(",0.00000000"));
    }

    #[test]
    fn heatmap_json_is_corr_major() {
        let out = sample_output(60);
        let json = export_heatmap_json(&HeatmapView::from_output(&out)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let z = value["z"].as_array().unwrap();
        assert_eq!(z.len(), 20);
        assert_eq!(z[0].as_array().unwrap().len(), out.correlation.len());
        assert_eq!(value["insufficient_data"], false);
    }

    #[test]
    fn save_artifacts_writes_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let out = sample_output(50);
        let config = AppConfig::default();

        let run_dir = save_artifacts(&out, &config, dir.path()).unwrap();

        assert!(run_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("BTC-USDT_"));
        for name in ["timeseries.csv", "heatmap.json", "manifest.json"] {
            assert!(run_dir.join(name).is_file(), "missing {name}");
        }

        let manifest: RunManifest =
            serde_json::from_str(&std::fs::read_to_string(run_dir.join("manifest.json")).unwrap())
                .unwrap();
        assert_eq!(manifest.schema_version, SCHEMA_VERSION);
        assert_eq!(manifest.symbol, "BTC/USDT");
        assert_eq!(manifest.timeframe, "1h");
        assert_eq!(manifest.price_samples, 50);
        assert_eq!(manifest.dataset_hash, out.dataset_hash);
    }

    #[test]
    fn insufficient_run_still_exports() {
        let dir = tempfile::tempdir().unwrap();
        let out = sample_output(5);
        let run_dir = save_artifacts(&out, &AppConfig::default(), dir.path()).unwrap();

        let heatmap: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(run_dir.join("heatmap.json")).unwrap())
                .unwrap();
        assert_eq!(heatmap["insufficient_data"], true);
        assert!(heatmap["time_labels"].as_array().unwrap().is_empty());
    }
}
