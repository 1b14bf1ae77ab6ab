//! Backfolio Market Data Crate
//!
//! Provider-agnostic price-series models and date resolution for the
//! backtesting engine.
//!
//! # Overview
//!
//! This crate supplies:
//! - Immutable, date-ordered price series per ticker
//! - A coverage descriptor summarizing how well a series covers a
//!   requested simulation window
//! - The [`PriceResolver`], which turns an arbitrary calendar date into a
//!   usable price even when the underlying series is sparse
//! - The [`MarketDataProviderTrait`] seam behind which embedders plug
//!   their actual price feed; the engine itself performs no network or
//!   storage I/O
//!
//! # Core Types
//!
//! - [`PricePoint`] - a single dated observation
//! - [`PriceSeries`] - the sorted, validated series for one ticker
//! - [`SeriesCoverage`] / [`CoverageStatus`] - availability descriptor
//! - [`PriceResolver`] - exact-first date resolution with bounded
//!   lookahead/lookback windows and a last-observation fallback

pub mod errors;
pub mod models;
pub mod provider;
pub mod resolver;

pub use errors::{MarketDataError, Result};
pub use models::{CoverageStatus, PricePoint, PriceSeries, SeriesCoverage};
pub use provider::{ManualProvider, MarketDataProviderTrait};
pub use resolver::{PriceResolver, ResolverWindows, DEFAULT_LOOKAHEAD_DAYS, DEFAULT_LOOKBACK_DAYS};
