//! The analytical core: sentiment derivation, rolling correlation, density
//! binning, and the normalization helper for the time-series view.
//!
//! Every function here is pure and deterministic: identical inputs give
//! bit-identical outputs.

pub mod correlation;
pub mod density;
pub mod normalize;
pub mod sentiment;

pub use correlation::{correlate, pearson, CorrelationError, DEFAULT_WINDOW};
pub use density::{bin_density, bucket_edges, corr_bucket, DensityGrid, DEFAULT_BINS};
pub use normalize::{normalize, NormalizedSeries};
pub use sentiment::{derive, derive_with_scale, pct_change, DEFAULT_SENTIMENT_SCALE};
