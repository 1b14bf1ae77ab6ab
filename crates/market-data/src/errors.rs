//! Market data error types.

use thiserror::Error;

/// Type alias for Result using our MarketDataError type.
pub type Result<T> = std::result::Result<T, MarketDataError>;

#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The underlying feed failed to deliver data.
    #[error("Provider error: {0}")]
    Provider(String),

    /// No usable observation exists for the symbol.
    #[error("No price data available for symbol {0}")]
    NoData(String),

    /// An observation was malformed (bad date, non-positive price, ...).
    #[error("Invalid price observation: {0}")]
    InvalidObservation(String),
}
