//! Pre-flight validation and the simulation orchestration service.
//!
//! Fetching price data is a distinct, earlier asynchronous stage: all series
//! are prefetched concurrently through the provider seam, then the strictly
//! sequential driver runs over the in-memory data with no I/O of its own.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use futures::future::join_all;
use log::{error, info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use backfolio_market_data::{
    MarketDataProviderTrait, PriceResolver, PriceSeries, ResolverWindows, SeriesCoverage,
};

use crate::errors::{Error, Result};
use crate::performance::MetricsService;

use super::simulation_driver::SimulationDriver;
use super::simulation_model::{SimulationConfig, SimulationResult};

#[async_trait]
pub trait SimulationServiceTrait: Send + Sync {
    /// Runs a full simulation: prefetch all series concurrently, validate,
    /// drive the sequential month loop, derive metrics.
    async fn run(&self, config: &SimulationConfig) -> Result<SimulationResult>;
}

pub struct SimulationService {
    provider: Arc<dyn MarketDataProviderTrait>,
}

impl SimulationService {
    pub fn new(provider: Arc<dyn MarketDataProviderTrait>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl SimulationServiceTrait for SimulationService {
    async fn run(&self, config: &SimulationConfig) -> Result<SimulationResult> {
        // Prefetch padded by the resolver windows so boundary months resolve.
        let fetch_start = config.start_date - Duration::days(config.policy.lookback_days);
        let fetch_end = config.end_date + Duration::days(config.policy.lookahead_days);

        let fetches = config.targets.iter().map(|target| {
            let provider = Arc::clone(&self.provider);
            let ticker = target.ticker.clone();
            async move {
                let prices = provider
                    .historical_prices(&ticker, fetch_start, fetch_end)
                    .await?;
                let coverage = provider.coverage(&ticker, fetch_start, fetch_end).await?;
                Ok::<_, Error>((ticker, prices, coverage))
            }
        });

        let mut series = HashMap::new();
        let mut coverages = Vec::new();
        for fetched in join_all(fetches).await {
            let (ticker, prices, coverage) = fetched?;
            series.insert(ticker, PriceSeries::new(prices));
            coverages.push(coverage);
        }

        validate(config, &coverages)?;

        let resolver = PriceResolver::with_windows(
            series,
            ResolverWindows {
                lookahead_days: config.policy.lookahead_days,
                lookback_days: config.policy.lookback_days,
            },
        );

        let output = SimulationDriver::new(config, &resolver).run();
        info!(
            "Simulation produced {} snapshots, {} ledger rows, {} missed months",
            output.evolution.len(),
            output.ledger.len(),
            output.missed_contributions
        );

        let metrics = MetricsService::new(config.policy.risk_free_rate).calculate(
            &output.evolution,
            output.ledger.rows(),
            &output.final_prices,
        );

        Ok(SimulationResult {
            evolution: output.evolution,
            ledger: output.ledger.into_rows(),
            metrics,
            missed_contributions: output.missed_contributions,
        })
    }
}

/// Pre-flight validation. Every problem found is collected and surfaced
/// together; any problem is fatal before the run starts.
///
/// A single asset without usable coverage is NOT fatal - it degrades month
/// by month and simply never trades. Only a run with nothing to simulate is
/// rejected.
pub fn validate(config: &SimulationConfig, coverages: &[SeriesCoverage]) -> Result<()> {
    let mut problems: Vec<String> = Vec::new();

    if config.targets.is_empty() {
        problems.push("no assets configured".to_string());
    }

    for target in &config.targets {
        if target.target_allocation <= Decimal::ZERO || target.target_allocation > Decimal::ONE {
            problems.push(format!(
                "allocation for {} must be in (0, 1], got {}",
                target.ticker, target.target_allocation
            ));
        }
        if target.avg_annual_dividend_yield < Decimal::ZERO {
            problems.push(format!(
                "dividend yield for {} must not be negative, got {}",
                target.ticker, target.avg_annual_dividend_yield
            ));
        }
    }

    if !config.targets.is_empty() {
        let total: Decimal = config.targets.iter().map(|t| t.target_allocation).sum();
        if (total - Decimal::ONE).abs() > dec!(0.01) {
            problems.push(format!("allocations must sum to 1, got {}", total));
        }
    }

    if config.start_date > config.end_date {
        problems.push(format!(
            "start date {} is after end date {}",
            config.start_date, config.end_date
        ));
    }
    if config.initial_capital < Decimal::ZERO {
        problems.push("initial capital must not be negative".to_string());
    }
    if config.monthly_contribution < Decimal::ZERO {
        problems.push("monthly contribution must not be negative".to_string());
    }

    for coverage in coverages {
        if !coverage.status.is_usable() {
            warn!(
                "No usable price data for {} in the requested window ({} observations)",
                coverage.ticker, coverage.observations
            );
        }
    }
    if !coverages.is_empty() && coverages.iter().all(|c| !c.status.is_usable()) {
        problems.push("no price data available for any configured asset".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        error!("Simulation rejected: {}", problems.join("; "));
        Err(Error::InsufficientData(problems))
    }
}
