//! The price-feed provider seam.
//!
//! The engine never fetches data itself; it consumes whatever implementation
//! of [`MarketDataProviderTrait`] the embedding application wires in. The
//! [`ManualProvider`] here serves pre-loaded, in-memory series and is what
//! tests and offline embedders use.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;

use crate::errors::Result;
use crate::models::{PricePoint, PriceSeries, SeriesCoverage};

#[async_trait]
pub trait MarketDataProviderTrait: Send + Sync {
    /// Ordered (possibly sparse) observations for `ticker` within
    /// `[start, end]`, both inclusive. An unknown ticker yields an empty
    /// vector, not an error — data gaps degrade, they do not abort.
    async fn historical_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>>;

    /// Coverage descriptor for `ticker` against the requested window.
    async fn coverage(&self, ticker: &str, start: NaiveDate, end: NaiveDate)
        -> Result<SeriesCoverage>;
}

/// In-memory provider over manually supplied series.
#[derive(Debug, Clone, Default)]
pub struct ManualProvider {
    series: HashMap<String, PriceSeries>,
}

impl ManualProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(series: HashMap<String, Vec<PricePoint>>) -> Self {
        Self {
            series: series
                .into_iter()
                .map(|(ticker, points)| (ticker, PriceSeries::new(points)))
                .collect(),
        }
    }

    pub fn add_series(&mut self, ticker: &str, points: Vec<PricePoint>) {
        self.series
            .insert(ticker.to_string(), PriceSeries::new(points));
    }
}

#[async_trait]
impl MarketDataProviderTrait for ManualProvider {
    async fn historical_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        let points = match self.series.get(ticker) {
            Some(series) => series
                .points()
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect(),
            None => {
                debug!("ManualProvider has no series for {}", ticker);
                Vec::new()
            }
        };
        Ok(points)
    }

    async fn coverage(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SeriesCoverage> {
        let empty = PriceSeries::default();
        let series = self.series.get(ticker).unwrap_or(&empty);
        Ok(SeriesCoverage::describe(ticker, series, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CoverageStatus;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn manual_provider_filters_to_window() {
        let mut provider = ManualProvider::new();
        provider.add_series(
            "A",
            vec![
                PricePoint::new(d(2020, 1, 1), dec!(10), dec!(10)),
                PricePoint::new(d(2020, 6, 1), dec!(11), dec!(11)),
                PricePoint::new(d(2021, 1, 1), dec!(12), dec!(12)),
            ],
        );

        let points = provider
            .historical_prices("A", d(2020, 2, 1), d(2020, 12, 1))
            .await
            .unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, d(2020, 6, 1));
    }

    #[tokio::test]
    async fn unknown_ticker_yields_empty_not_error() {
        let provider = ManualProvider::new();
        let points = provider
            .historical_prices("MISSING", d(2020, 1, 1), d(2020, 12, 1))
            .await
            .unwrap();
        assert!(points.is_empty());

        let coverage = provider
            .coverage("MISSING", d(2020, 1, 1), d(2020, 12, 1))
            .await
            .unwrap();
        assert_eq!(coverage.status, CoverageStatus::Missing);
    }
}
