//! Simulation configuration and evolution models.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocation::AssetAllocationTarget;
use crate::constants::{DEFAULT_MIN_REBALANCE_VALUE, DEFAULT_RISK_FREE_RATE};
use crate::dividends::DividendCalendar;
use crate::performance::SimulationMetrics;
use crate::rebalance::Transaction;

use backfolio_market_data::{DEFAULT_LOOKAHEAD_DAYS, DEFAULT_LOOKBACK_DAYS};

/// How often the portfolio is rebalanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebalanceFrequency {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl RebalanceFrequency {
    pub fn interval_months(&self) -> u32 {
        match self {
            RebalanceFrequency::Monthly => 1,
            RebalanceFrequency::Quarterly => 3,
            RebalanceFrequency::Yearly => 12,
        }
    }

    /// True when the month at `month_index` (0-based) is a rebalance month.
    pub fn is_scheduled(&self, month_index: u32) -> bool {
        month_index % self.interval_months() == 0
    }
}

/// Policy knobs with documented defaults. These encode business policy
/// (thresholds, windows, seasonality) rather than engine mechanics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationPolicy {
    /// Minimum proceeds for a rebalancing sale to execute.
    pub min_rebalance_value: Decimal,
    /// Days the price resolver searches forward of a target date.
    pub lookahead_days: i64,
    /// Days the price resolver searches backward of a target date.
    pub lookback_days: i64,
    pub dividend_calendar: DividendCalendar,
    /// Annual risk-free rate for the Sharpe ratio.
    pub risk_free_rate: Decimal,
}

impl Default for SimulationPolicy {
    fn default() -> Self {
        Self {
            min_rebalance_value: DEFAULT_MIN_REBALANCE_VALUE,
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            dividend_calendar: DividendCalendar::default(),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

/// Complete input of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    pub targets: Vec<AssetAllocationTarget>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: Decimal,
    pub monthly_contribution: Decimal,
    #[serde(default)]
    pub rebalance_frequency: RebalanceFrequency,
    #[serde(default)]
    pub policy: SimulationPolicy,
}

/// One recorded month of the simulated portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySnapshot {
    /// Month-end valuation date.
    pub date: NaiveDate,
    pub total_value: Decimal,
    /// Own capital put in so far (initial capital + contributions).
    pub invested_capital: Decimal,
    pub cash_balance: Decimal,
    pub holdings: BTreeMap<String, u64>,
    pub monthly_return: Decimal,
    /// Own money added this month.
    pub contribution: Decimal,
}

/// Complete output of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub evolution: Vec<MonthlySnapshot>,
    pub ledger: Vec<Transaction>,
    pub metrics: SimulationMetrics,
    /// Months skipped because no asset had a resolvable price.
    pub missed_contributions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebalance_scheduling_by_month_index() {
        assert!(RebalanceFrequency::Monthly.is_scheduled(0));
        assert!(RebalanceFrequency::Monthly.is_scheduled(7));

        assert!(RebalanceFrequency::Quarterly.is_scheduled(0));
        assert!(!RebalanceFrequency::Quarterly.is_scheduled(2));
        assert!(RebalanceFrequency::Quarterly.is_scheduled(3));

        assert!(RebalanceFrequency::Yearly.is_scheduled(12));
        assert!(!RebalanceFrequency::Yearly.is_scheduled(6));
    }
}
