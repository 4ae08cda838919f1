//! Domain types for SentCorr

pub mod series;
pub mod timeframe;

pub use series::{
    CorrelationPoint, CorrelationSeries, PricePoint, PriceSeries, SentimentPoint,
    SentimentSeries, SeriesError,
};
pub use timeframe::{Timeframe, TimeframeError};

/// Symbol type alias
pub type Symbol = String;
