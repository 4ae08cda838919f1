//! Price acquisition

pub mod binance;
pub mod csv_import;
pub mod provider;
pub mod synthetic;

pub use binance::BinanceProvider;
pub use csv_import::CsvProvider;
pub use provider::{clip_to_request, DataError, DataSource, FetchRequest, PriceProvider};
pub use synthetic::SyntheticProvider;
