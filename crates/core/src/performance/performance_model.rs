//! Performance metric models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Summary metrics derived from a run's ledger and evolution series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationMetrics {
    /// Own capital put in, reconstructed from CONTRIBUTION entry rows.
    pub invested_capital: Decimal,
    pub final_value: Decimal,
    pub total_return: Decimal,
    pub annualized_return: Decimal,
    /// Annualized standard deviation of monthly returns.
    pub volatility: Decimal,
    /// `None` when volatility is zero or the ratio is undefined.
    pub sharpe_ratio: Option<Decimal>,
    /// Largest peak-to-trough decline of the evolution values.
    pub max_drawdown: Decimal,
    pub asset_performance: Vec<AssetPerformance>,
}

impl SimulationMetrics {
    /// Sentinel metrics for a run that recorded nothing.
    pub fn empty() -> Self {
        Self {
            invested_capital: Decimal::ZERO,
            final_value: Decimal::ZERO,
            total_return: Decimal::ZERO,
            annualized_return: Decimal::ZERO,
            volatility: Decimal::ZERO,
            sharpe_ratio: None,
            max_drawdown: Decimal::ZERO,
            asset_performance: Vec::new(),
        }
    }
}

/// Aggregated flows and outcome for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPerformance {
    pub ticker: String,
    pub shares_held: u64,
    /// Cost basis of the surviving shares (scaled down on partial sales).
    pub cost_basis: Decimal,
    /// Average effective cost per surviving share, with realized profit
    /// counted as capital already recovered. `None` when nothing is held.
    pub average_cost: Option<Decimal>,
    pub dividends_received: Decimal,
    pub realized_gain: Decimal,
    pub final_value: Decimal,
    pub total_return: Decimal,
}
