//! Integer-share rebalancing toward target allocations.
//!
//! The engine values current holdings, renormalizes targets over the assets
//! that actually have a price this month, sells above-target positions down
//! (subject to a minimum-proceeds threshold that prevents thrashing), and
//! buys below-target positions up with whatever cash the pool can fund,
//! attributing every purchase back to its funding sources.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::debug;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use backfolio_market_data::PriceResolver;

use crate::allocation::{renormalize_targets, AssetAllocationTarget};
use crate::constants::DEFAULT_MIN_REBALANCE_VALUE;

use super::rebalance_model::{CashPool, CashSource, Ledger, TransactionType};

/// One asset's position relative to its integer share target this month.
struct TradePlan<'a> {
    ticker: &'a str,
    price: Decimal,
    current: u64,
    target: u64,
}

pub struct RebalanceEngine {
    min_rebalance_value: Decimal,
}

impl Default for RebalanceEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_REBALANCE_VALUE)
    }
}

impl RebalanceEngine {
    pub fn new(min_rebalance_value: Decimal) -> Self {
        Self {
            min_rebalance_value,
        }
    }

    /// Rebalances `holdings` toward `targets` at `date`'s resolved prices,
    /// appending the resulting trades to `ledger`. Assets without a
    /// windowed-resolvable price are skipped entirely this month: not
    /// valued, not traded, excluded from target renormalization.
    pub fn rebalance(
        &self,
        targets: &[AssetAllocationTarget],
        resolver: &PriceResolver,
        holdings: &mut BTreeMap<String, u64>,
        cash: &mut CashPool,
        ledger: &mut Ledger,
        month_index: u32,
        date: NaiveDate,
    ) {
        let mut prices: BTreeMap<&str, Decimal> = BTreeMap::new();
        for target in targets {
            match resolver.resolve_windowed(&target.ticker, date) {
                Some(price) => {
                    prices.insert(target.ticker.as_str(), price);
                }
                None => {
                    debug!(
                        "No resolvable price for {} on {}; asset skipped this month",
                        target.ticker, date
                    );
                }
            }
        }

        let weighted = renormalize_targets(targets, |ticker| prices.contains_key(ticker));
        if weighted.is_empty() {
            return;
        }

        let mut current_assets_value = Decimal::ZERO;
        for (target, _) in &weighted {
            if let Some(price) = prices.get(target.ticker.as_str()) {
                let shares = holdings.get(&target.ticker).copied().unwrap_or(0);
                current_assets_value += Decimal::from(shares) * *price;
            }
        }
        let total_investable = current_assets_value + cash.total();

        let mut plans: Vec<TradePlan> = Vec::with_capacity(weighted.len());
        for (target, fraction) in &weighted {
            let Some(price) = prices.get(target.ticker.as_str()).copied() else {
                continue;
            };
            // Integer shares only; the fractional remainder stays cash.
            let target_shares = (total_investable * *fraction / price)
                .floor()
                .to_u64()
                .unwrap_or(0);
            plans.push(TradePlan {
                ticker: &target.ticker,
                price,
                current: holdings.get(&target.ticker).copied().unwrap_or(0),
                target: target_shares,
            });
        }

        self.sell_phase(&plans, holdings, cash, ledger, month_index, date);
        self.buy_phase(&plans, holdings, cash, ledger, month_index, date);
    }

    /// Sells above-target holdings down to target, deferring reductions
    /// whose proceeds fall under the minimum-value threshold.
    fn sell_phase(
        &self,
        plans: &[TradePlan],
        holdings: &mut BTreeMap<String, u64>,
        cash: &mut CashPool,
        ledger: &mut Ledger,
        month_index: u32,
        date: NaiveDate,
    ) {
        for plan in plans.iter().filter(|p| p.current > p.target) {
            let sell = plan.current - plan.target;
            let proceeds = Decimal::from(sell) * plan.price;

            if proceeds < self.min_rebalance_value {
                debug!(
                    "Deferring sale of {} x {} (proceeds {} below minimum {})",
                    sell, plan.ticker, proceeds, self.min_rebalance_value
                );
                continue;
            }

            if let Some(shares) = holdings.get_mut(plan.ticker) {
                *shares -= sell;
            }
            cash.credit(CashSource::SaleProceeds, proceeds);
            ledger.record(
                month_index,
                date,
                Some(plan.ticker),
                TransactionType::RebalanceSell,
                proceeds,
                Some(plan.price),
                -(sell as i64),
            );
        }
    }

    /// Buys below-target holdings up to the smaller of the desired delta and
    /// what the pooled cash can fund at this price.
    fn buy_phase(
        &self,
        plans: &[TradePlan],
        holdings: &mut BTreeMap<String, u64>,
        cash: &mut CashPool,
        ledger: &mut Ledger,
        month_index: u32,
        date: NaiveDate,
    ) {
        for plan in plans.iter().filter(|p| p.current < p.target) {
            let desired = plan.target - plan.current;
            let affordable = (cash.total() / plan.price).floor().to_u64().unwrap_or(0);
            let qty = desired.min(affordable);
            if qty == 0 {
                debug!(
                    "No affordable shares of {} at {} (cash {})",
                    plan.ticker,
                    plan.price,
                    cash.total()
                );
                continue;
            }

            let cost = Decimal::from(qty) * plan.price;
            record_attributed_purchase(
                plan.ticker, plan.price, qty, cost, cash, ledger, month_index, date,
            );
            *holdings.entry(plan.ticker.to_string()).or_insert(0) += qty;
        }
    }
}

/// Draws `cost` from the pool in priority order and writes one ledger row
/// per contributing source. Share counts are split proportionally to each
/// source's cash share and rounded; the largest component absorbs the
/// rounding drift so the parts sum exactly to `qty`.
#[allow(clippy::too_many_arguments)]
fn record_attributed_purchase(
    ticker: &str,
    price: Decimal,
    qty: u64,
    cost: Decimal,
    cash: &mut CashPool,
    ledger: &mut Ledger,
    month_index: u32,
    date: NaiveDate,
) {
    let draws = cash.draw(cost);

    let mut parts: Vec<(CashSource, Decimal, i64)> = draws
        .into_iter()
        .map(|(source, amount)| {
            let share_part = (Decimal::from(qty) * amount / cost)
                .round()
                .to_i64()
                .unwrap_or(0);
            (source, amount, share_part)
        })
        .collect();

    let assigned: i64 = parts.iter().map(|(_, _, shares)| *shares).sum();
    let drift = qty as i64 - assigned;
    if drift != 0 {
        if let Some(largest) = parts.iter_mut().max_by_key(|(_, amount, _)| *amount) {
            largest.2 += drift;
        }
    }

    for (source, amount, share_part) in parts {
        ledger.record(
            month_index,
            date,
            Some(ticker),
            source.purchase_kind(),
            -amount,
            Some(price),
            share_part,
        );
    }
}
