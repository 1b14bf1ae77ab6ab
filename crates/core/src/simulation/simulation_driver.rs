//! The sequential month-by-month simulation state machine.
//!
//! Each month's output state (holdings, cash sub-balances, ledger, running
//! totals) is the next month's input, so months are never reordered. Missing
//! data degrades to a skipped month; the loop never aborts mid-run.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use log::{debug, warn};
use rust_decimal::Decimal;

use backfolio_market_data::PriceResolver;

use crate::constants::{CASH_DUST_THRESHOLD, DECIMAL_PRECISION};
use crate::dividends::DividendAccrualService;
use crate::rebalance::{CashPool, CashSource, Ledger, RebalanceEngine, TransactionType};

use super::simulation_model::{MonthlySnapshot, SimulationConfig};

/// Raw output of the driver loop, before metrics derivation.
pub struct DriverOutput {
    pub evolution: Vec<MonthlySnapshot>,
    pub ledger: Ledger,
    pub missed_contributions: u32,
    /// Last month-end resolved price per held ticker, for per-asset metrics.
    pub final_prices: BTreeMap<String, Decimal>,
}

pub struct SimulationDriver<'a> {
    config: &'a SimulationConfig,
    resolver: &'a PriceResolver,
    dividends: DividendAccrualService,
    engine: RebalanceEngine,
}

impl<'a> SimulationDriver<'a> {
    pub fn new(config: &'a SimulationConfig, resolver: &'a PriceResolver) -> Self {
        Self {
            config,
            resolver,
            dividends: DividendAccrualService::new(config.policy.dividend_calendar.clone()),
            engine: RebalanceEngine::new(config.policy.min_rebalance_value),
        }
    }

    pub fn run(&self) -> DriverOutput {
        let config = self.config;
        let targets = &config.targets;

        let mut holdings: BTreeMap<String, u64> = BTreeMap::new();
        let mut ledger = Ledger::new();
        let mut evolution: Vec<MonthlySnapshot> = Vec::new();
        let mut final_prices: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut missed_contributions = 0u32;
        let mut carried = Decimal::ZERO;
        let mut prev_end_value: Option<Decimal> = None;
        let mut invested_capital = Decimal::ZERO;

        let mut month_start = first_of_month(config.start_date);
        let mut month_index = 0u32;

        while month_start <= config.end_date {
            let month_end = end_of_month(month_start);

            // S0: is any asset priced within tolerance this month?
            let any_available = targets
                .iter()
                .any(|t| self.resolver.resolve_windowed(&t.ticker, month_start).is_some());
            if !any_available {
                warn!(
                    "No asset has a resolvable price around {}; contribution missed",
                    month_start
                );
                missed_contributions += 1;
                month_start = month_start + Months::new(1);
                month_index += 1;
                continue;
            }

            let mut cash = CashPool::default();

            // Cash reserved at the previous month's end re-enters the pool.
            if carried > CASH_DUST_THRESHOLD {
                cash.credit(CashSource::PreviousLeftover, carried);
                ledger.record(
                    month_index,
                    month_start,
                    None,
                    TransactionType::CashCredit,
                    carried,
                    None,
                    0,
                );
            } else if carried > Decimal::ZERO {
                // Dust carries silently; no reserve row was written for it.
                cash.credit(CashSource::PreviousLeftover, carried);
            }
            carried = Decimal::ZERO;

            // S1: dividends accrue from the second month on.
            if month_index > 0 {
                let accrued = self.dividends.accrue(
                    &holdings,
                    targets,
                    self.resolver,
                    month_index,
                    month_start,
                    &mut ledger,
                );
                if accrued > Decimal::ZERO {
                    cash.credit(CashSource::DividendCash, accrued);
                }
            }

            // S2: own new money enters; this row is what invested capital is
            // later reconstructed from.
            let own = if month_index == 0 {
                config.initial_capital + config.monthly_contribution
            } else {
                config.monthly_contribution
            };
            if own > Decimal::ZERO {
                cash.credit(CashSource::OwnContribution, own);
                ledger.record(
                    month_index,
                    month_start,
                    None,
                    TransactionType::Contribution,
                    own,
                    None,
                    0,
                );
                invested_capital += own;
            }

            // S3: scheduled rebalance at month-start prices.
            if config.rebalance_frequency.is_scheduled(month_index) {
                self.engine.rebalance(
                    targets,
                    self.resolver,
                    &mut holdings,
                    &mut cash,
                    &mut ledger,
                    month_index,
                    month_start,
                );
            } else {
                debug!("Month {} not scheduled for rebalancing", month_index);
            }

            // S4: value holdings at month-end prices, a distinct and later
            // resolution than the one trades executed at.
            let mut holdings_value = Decimal::ZERO;
            for (ticker, shares) in &holdings {
                if *shares == 0 {
                    continue;
                }
                match self.resolver.resolve(ticker, month_end) {
                    Some(price) => {
                        holdings_value += Decimal::from(*shares) * price;
                        final_prices.insert(ticker.clone(), price);
                    }
                    None => warn!(
                        "No month-end price for held asset {} on {}",
                        ticker, month_end
                    ),
                }
            }
            let cash_balance = cash.total();
            let end_value = holdings_value + cash_balance;

            // S5: monthly return relative to the previous recorded month.
            let monthly_return = match prev_end_value {
                None => {
                    if own.is_zero() {
                        Decimal::ZERO
                    } else {
                        (end_value - own) / own
                    }
                }
                Some(prev) if !prev.is_zero() => (end_value - prev - own) / prev,
                Some(_) => Decimal::ZERO,
            };

            // S6: snapshot, then set unspent cash aside for next month.
            evolution.push(MonthlySnapshot {
                date: month_end,
                total_value: end_value.round_dp(DECIMAL_PRECISION),
                invested_capital,
                cash_balance,
                holdings: holdings.clone(),
                monthly_return: monthly_return.round_dp(DECIMAL_PRECISION),
                contribution: own,
            });

            let leftover = cash.total();
            if leftover > CASH_DUST_THRESHOLD {
                ledger.record(
                    month_index,
                    month_end,
                    None,
                    TransactionType::CashReserve,
                    -leftover,
                    None,
                    0,
                );
            }
            carried = leftover;
            prev_end_value = Some(end_value);

            month_start = month_start + Months::new(1);
            month_index += 1;
        }

        DriverOutput {
            evolution,
            ledger,
            missed_contributions,
            final_prices,
        }
    }
}

/// First calendar day of `date`'s month.
pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Last calendar day of the month starting at `first`.
pub(crate) fn end_of_month(first: NaiveDate) -> NaiveDate {
    first + Months::new(1) - Duration::days(1)
}
