//! SentCorr Core — price acquisition and the price/sentiment correlation pipeline.
//!
//! This crate contains:
//! - Domain types (price, sentiment and correlation series; timeframes)
//! - Price providers (Binance klines, CSV import, synthetic walk)
//! - Sentiment derivation from price returns
//! - Rolling Pearson correlation with degenerate-window dropping
//! - Log-density binning for the correlation heatmap
//! - Min-max normalization for the overlaid time-series view
//! - Renderer-facing views and TOML configuration

pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod pipeline;
pub mod render;

pub use config::{AppConfig, ConfigError};
pub use pipeline::{analyze, run, Diagnostic, PipelineError, PipelineOutput, PipelineParams};
pub use render::{HeatmapView, TimeSeriesView};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: pipeline types can cross thread boundaries, so a
    /// driver may hand a finished run to a rendering thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::SentimentSeries>();
        require_sync::<domain::SentimentSeries>();
        require_send::<domain::CorrelationSeries>();
        require_sync::<domain::CorrelationSeries>();
        require_send::<analysis::DensityGrid>();
        require_sync::<analysis::DensityGrid>();
        require_send::<PipelineOutput>();
        require_sync::<PipelineOutput>();
        require_send::<HeatmapView>();
        require_sync::<HeatmapView>();

        require_send::<data::BinanceProvider>();
        require_sync::<data::BinanceProvider>();
        require_send::<data::CsvProvider>();
        require_sync::<data::CsvProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
    }

    /// Providers are usable behind a trait object, which is how the pipeline
    /// takes them.
    #[test]
    fn providers_are_object_safe() {
        let providers: Vec<Box<dyn data::PriceProvider>> = vec![
            Box::new(data::SyntheticProvider::new()),
            Box::new(data::CsvProvider::new("prices.csv")),
        ];
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["synthetic", "csv_import"]);
    }
}
