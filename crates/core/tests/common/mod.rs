//! Shared fixtures for integration tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use backfolio_core::allocation::AssetAllocationTarget;
use backfolio_core::{RebalanceFrequency, SimulationConfig};
use backfolio_market_data::{ManualProvider, PricePoint};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One observation on the first of each month of `year`, at a flat price.
pub fn flat_year(year: i32, price: Decimal) -> Vec<PricePoint> {
    (1..=12)
        .map(|m| PricePoint::new(date(year, m, 1), price, price))
        .collect()
}

/// Observations on the first of each month, prices supplied per month.
pub fn monthly_prices(year: i32, prices: &[Decimal]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, p)| PricePoint::new(date(year, i as u32 + 1, 1), *p, *p))
        .collect()
}

pub fn provider_with(series: Vec<(&str, Vec<PricePoint>)>) -> ManualProvider {
    let mut provider = ManualProvider::new();
    for (ticker, points) in series {
        provider.add_series(ticker, points);
    }
    provider
}

/// A year-long 2020 run with sensible defaults.
pub fn year_config(targets: Vec<AssetAllocationTarget>) -> SimulationConfig {
    SimulationConfig {
        targets,
        start_date: date(2020, 1, 1),
        end_date: date(2020, 12, 31),
        initial_capital: Decimal::ZERO,
        monthly_contribution: dec!(100),
        rebalance_frequency: RebalanceFrequency::Monthly,
        policy: Default::default(),
    }
}
