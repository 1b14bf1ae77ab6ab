//! Metric derivation from the ledger and evolution series.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::constants::{
    DECIMAL_PRECISION, DEFAULT_RISK_FREE_RATE, MONTHS_PER_YEAR, SQRT_MONTHS_PER_YEAR_APPROX,
};
use crate::rebalance::{Transaction, TransactionType};
use crate::simulation::MonthlySnapshot;

use super::performance_model::{AssetPerformance, SimulationMetrics};

pub struct MetricsService {
    risk_free_rate: Decimal,
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_FREE_RATE)
    }
}

impl MetricsService {
    pub fn new(risk_free_rate: Decimal) -> Self {
        Self { risk_free_rate }
    }

    /// Derives summary and per-asset metrics for a completed run.
    ///
    /// Invested capital is reconstructed strictly from CONTRIBUTION entry
    /// rows (`share_delta == 0`); PREVIOUS_CASH_USE and
    /// DIVIDEND_REINVESTMENT purchases recycle money counted at entry and
    /// are excluded.
    pub fn calculate(
        &self,
        evolution: &[MonthlySnapshot],
        ledger: &[Transaction],
        final_prices: &BTreeMap<String, Decimal>,
    ) -> SimulationMetrics {
        if evolution.is_empty() {
            return SimulationMetrics::empty();
        }

        let invested_capital: Decimal = ledger
            .iter()
            .filter(|t| {
                t.kind == TransactionType::Contribution
                    && t.share_delta == 0
                    && t.cash_delta > Decimal::ZERO
            })
            .map(|t| t.cash_delta)
            .sum();

        let final_value = evolution
            .last()
            .map(|s| s.total_value)
            .unwrap_or(Decimal::ZERO);

        let total_return = if invested_capital.is_zero() {
            Decimal::ZERO
        } else {
            (final_value - invested_capital) / invested_capital
        };

        let annualized_return =
            annualize_return(invested_capital, final_value, evolution.len() as u32);

        let monthly_returns: Vec<Decimal> = evolution.iter().map(|s| s.monthly_return).collect();
        let volatility = calculate_volatility(&monthly_returns);

        let sharpe_ratio = if volatility.is_zero() {
            None
        } else {
            (annualized_return - self.risk_free_rate).checked_div(volatility)
        };

        let values: Vec<Decimal> = evolution.iter().map(|s| s.total_value).collect();
        let max_drawdown = calculate_max_drawdown(&values);

        let asset_performance = calculate_asset_performance(ledger, final_prices);

        SimulationMetrics {
            invested_capital,
            final_value,
            total_return: total_return.round_dp(DECIMAL_PRECISION),
            annualized_return: annualized_return.round_dp(DECIMAL_PRECISION),
            volatility: volatility.round_dp(DECIMAL_PRECISION),
            sharpe_ratio: sharpe_ratio.map(|s| s.round_dp(DECIMAL_PRECISION)),
            max_drawdown: max_drawdown.round_dp(DECIMAL_PRECISION),
            asset_performance,
        }
    }
}

/// `(final/invested)^(12/months) - 1`, with sentinels for degenerate inputs.
fn annualize_return(invested: Decimal, final_value: Decimal, months: u32) -> Decimal {
    if invested <= Decimal::ZERO || months == 0 {
        return Decimal::ZERO;
    }

    let growth = final_value / invested;
    if growth <= Decimal::ZERO {
        // A total loss (or worse) cannot be annualized meaningfully.
        return dec!(-1);
    }

    let exponent = MONTHS_PER_YEAR / Decimal::from(months);
    growth.powd(exponent) - Decimal::ONE
}

/// Sample standard deviation of monthly returns, annualized by sqrt(12).
fn calculate_volatility(monthly_returns: &[Decimal]) -> Decimal {
    if monthly_returns.len() < 2 {
        return Decimal::ZERO;
    }

    let count = Decimal::from(monthly_returns.len());
    let sum: Decimal = monthly_returns.iter().sum();
    let mean = sum / count;

    let sum_squared_diff: Decimal = monthly_returns
        .iter()
        .map(|&r| {
            let diff = r - mean;
            diff * diff
        })
        .sum();

    let variance = sum_squared_diff / (count - Decimal::ONE);
    if variance.is_sign_negative() {
        return Decimal::ZERO;
    }

    let monthly_volatility = variance.sqrt().unwrap_or(Decimal::ZERO);
    let annualization_factor = MONTHS_PER_YEAR
        .sqrt()
        .unwrap_or(SQRT_MONTHS_PER_YEAR_APPROX);

    monthly_volatility * annualization_factor
}

/// Largest `(peak - value) / peak` over the value series.
fn calculate_max_drawdown(values: &[Decimal]) -> Decimal {
    let mut peak = Decimal::ZERO;
    let mut max_drawdown = Decimal::ZERO;

    for &value in values {
        peak = peak.max(value);
        if peak > Decimal::ZERO {
            let drawdown = (peak - value) / peak;
            max_drawdown = max_drawdown.max(drawdown);
        }
    }

    max_drawdown.max(Decimal::ZERO)
}

/// Replays the ledger per ticker: purchases build cost basis, sales scale it
/// by the surviving-share fraction and realize the difference, dividends
/// accumulate separately.
fn calculate_asset_performance(
    ledger: &[Transaction],
    final_prices: &BTreeMap<String, Decimal>,
) -> Vec<AssetPerformance> {
    #[derive(Default)]
    struct Flows {
        shares: u64,
        cost_basis: Decimal,
        realized_gain: Decimal,
        dividends: Decimal,
    }

    let mut flows: BTreeMap<&str, Flows> = BTreeMap::new();

    for row in ledger {
        let Some(ticker) = row.ticker.as_deref() else {
            continue;
        };
        let entry = flows.entry(ticker).or_default();

        match row.kind {
            kind if kind.is_purchase() => {
                entry.cost_basis += -row.cash_delta;
                entry.shares = (entry.shares as i64 + row.share_delta).max(0) as u64;
            }
            TransactionType::RebalanceSell => {
                let sold = (-row.share_delta).max(0) as u64;
                let before = entry.shares;
                let removed = if before > 0 {
                    entry.cost_basis * Decimal::from(sold) / Decimal::from(before)
                } else {
                    entry.cost_basis
                };
                entry.realized_gain += row.cash_delta - removed;
                entry.cost_basis -= removed;
                entry.shares = entry.shares.saturating_sub(sold);
            }
            TransactionType::DividendPayment => {
                entry.dividends += row.cash_delta;
            }
            _ => {}
        }
    }

    flows
        .into_iter()
        .map(|(ticker, f)| {
            let final_value = final_prices
                .get(ticker)
                .map(|price| Decimal::from(f.shares) * *price)
                .unwrap_or(Decimal::ZERO);

            let average_cost = if f.shares > 0 {
                // Realized profit counts as capital already recovered.
                Some(((f.cost_basis - f.realized_gain) / Decimal::from(f.shares))
                    .round_dp(DECIMAL_PRECISION))
            } else {
                None
            };

            let total_return = if f.cost_basis > Decimal::ZERO {
                ((final_value + f.dividends + f.realized_gain - f.cost_basis) / f.cost_basis)
                    .round_dp(DECIMAL_PRECISION)
            } else {
                Decimal::ZERO
            };

            AssetPerformance {
                ticker: ticker.to_string(),
                shares_held: f.shares,
                cost_basis: f.cost_basis.round_dp(DECIMAL_PRECISION),
                average_cost,
                dividends_received: f.dividends,
                realized_gain: f.realized_gain.round_dp(DECIMAL_PRECISION),
                final_value: final_value.round_dp(DECIMAL_PRECISION),
                total_return,
            }
        })
        .collect()
}
