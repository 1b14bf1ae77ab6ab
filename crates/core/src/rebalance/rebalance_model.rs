//! Rebalancing domain models: the tagged transaction ledger and the
//! four-source cash pool.
//!
//! Cash available in a month is partitioned by funding origin and drawn down
//! in a fixed, documented priority order. Every purchase is attributed back
//! to the sub-balances that funded it, one ledger row per contributing
//! source, which makes the conservation invariant mechanically checkable
//! from the ledger alone.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Transaction kinds
// =============================================================================

/// Kind tag for a ledger row.
///
/// The four purchase kinds double as the cash-source attribution: a buy is
/// split into one row per contributing sub-balance. `Contribution` also
/// appears with `share_delta == 0` as the entry row of own new money — that
/// row is what the metrics layer reconstructs invested capital from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Own new money: the monthly contribution entering the pool, and
    /// purchases funded by the current month's contribution.
    Contribution,
    /// Purchase funded by dividend cash accrued this month.
    DividendReinvestment,
    /// Purchase funded by same-month rebalancing sale proceeds.
    RebalanceBuy,
    /// Shares sold down toward the target allocation.
    RebalanceSell,
    /// Purchase funded by cash carried over from earlier months.
    PreviousCashUse,
    /// Seasonal dividend cash credited for a held asset.
    DividendPayment,
    /// Carried-over cash re-entering at the start of a month.
    CashCredit,
    /// Unspent cash set aside at the end of a month.
    CashReserve,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Contribution => "CONTRIBUTION",
            TransactionType::DividendReinvestment => "DIVIDEND_REINVESTMENT",
            TransactionType::RebalanceBuy => "REBALANCE_BUY",
            TransactionType::RebalanceSell => "REBALANCE_SELL",
            TransactionType::PreviousCashUse => "PREVIOUS_CASH_USE",
            TransactionType::DividendPayment => "DIVIDEND_PAYMENT",
            TransactionType::CashCredit => "CASH_CREDIT",
            TransactionType::CashReserve => "CASH_RESERVE",
        }
    }

    /// True for the rows that add shares to a holding.
    pub fn is_purchase(&self) -> bool {
        matches!(
            self,
            TransactionType::Contribution
                | TransactionType::DividendReinvestment
                | TransactionType::RebalanceBuy
                | TransactionType::PreviousCashUse
        )
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Cash pool
// =============================================================================

/// Funding origin of available cash, in fixed draw-down priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashSource {
    PreviousLeftover,
    OwnContribution,
    DividendCash,
    SaleProceeds,
}

impl CashSource {
    /// Draw-down priority: leftover first, sale proceeds last.
    pub const DRAW_ORDER: [CashSource; 4] = [
        CashSource::PreviousLeftover,
        CashSource::OwnContribution,
        CashSource::DividendCash,
        CashSource::SaleProceeds,
    ];

    /// Ledger kind attributed to purchases funded from this source.
    pub fn purchase_kind(&self) -> TransactionType {
        match self {
            CashSource::PreviousLeftover => TransactionType::PreviousCashUse,
            CashSource::OwnContribution => TransactionType::Contribution,
            CashSource::DividendCash => TransactionType::DividendReinvestment,
            CashSource::SaleProceeds => TransactionType::RebalanceBuy,
        }
    }
}

/// Cash available within one simulated month, partitioned by funding origin.
///
/// The sub-balances always sum to the total available cash; draws leave
/// unspent amounts in their originating sub-balance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashPool {
    pub previous_leftover: Decimal,
    pub own_contribution: Decimal,
    pub dividend_cash: Decimal,
    pub sale_proceeds: Decimal,
}

impl CashPool {
    pub fn total(&self) -> Decimal {
        self.previous_leftover + self.own_contribution + self.dividend_cash + self.sale_proceeds
    }

    pub fn balance(&self, source: CashSource) -> Decimal {
        match source {
            CashSource::PreviousLeftover => self.previous_leftover,
            CashSource::OwnContribution => self.own_contribution,
            CashSource::DividendCash => self.dividend_cash,
            CashSource::SaleProceeds => self.sale_proceeds,
        }
    }

    fn balance_mut(&mut self, source: CashSource) -> &mut Decimal {
        match source {
            CashSource::PreviousLeftover => &mut self.previous_leftover,
            CashSource::OwnContribution => &mut self.own_contribution,
            CashSource::DividendCash => &mut self.dividend_cash,
            CashSource::SaleProceeds => &mut self.sale_proceeds,
        }
    }

    pub fn credit(&mut self, source: CashSource, amount: Decimal) {
        *self.balance_mut(source) += amount;
    }

    /// Draws `amount` across the sub-balances in fixed priority order and
    /// returns the non-zero per-source draws. The caller must not request
    /// more than `total()`.
    pub fn draw(&mut self, amount: Decimal) -> Vec<(CashSource, Decimal)> {
        let mut remaining = amount;
        let mut draws = Vec::new();

        for source in CashSource::DRAW_ORDER {
            if remaining <= Decimal::ZERO {
                break;
            }
            let balance = self.balance_mut(source);
            let take = (*balance).min(remaining);
            if take > Decimal::ZERO {
                *balance -= take;
                remaining -= take;
                draws.push((source, take));
            }
        }

        if remaining > Decimal::ZERO {
            error!(
                "Cash pool drawn beyond its total: {} requested, {} uncovered",
                amount, remaining
            );
        }
        draws
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Immutable ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub month_index: u32,
    pub date: NaiveDate,
    /// `None` for cash-level rows (contribution entry, reserve, credit).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub kind: TransactionType,
    /// Signed cash movement; positive credits the available balance.
    pub cash_delta: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Signed share movement for `ticker`; zero for cash-level rows.
    pub share_delta: i64,
    pub running_share_total: u64,
    pub running_cash_balance: Decimal,
}

/// Ordered, append-only list of all cash-affecting transactions of a run.
///
/// The ledger maintains the running cash balance and per-ticker running
/// share totals itself, so callers only supply deltas.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    rows: Vec<Transaction>,
    running_cash: Decimal,
    running_shares: BTreeMap<String, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        month_index: u32,
        date: NaiveDate,
        ticker: Option<&str>,
        kind: TransactionType,
        cash_delta: Decimal,
        price: Option<Decimal>,
        share_delta: i64,
    ) {
        self.running_cash += cash_delta;

        let running_share_total = match ticker {
            Some(ticker) => {
                let shares = self.running_shares.entry(ticker.to_string()).or_insert(0);
                let updated = *shares as i64 + share_delta;
                debug_assert!(updated >= 0, "share total for {} went negative", ticker);
                *shares = updated.max(0) as u64;
                *shares
            }
            None => 0,
        };

        self.rows.push(Transaction {
            month_index,
            date,
            ticker: ticker.map(str::to_string),
            kind,
            cash_delta,
            price,
            share_delta,
            running_share_total,
            running_cash_balance: self.running_cash,
        });
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn running_cash(&self) -> Decimal {
        self.running_cash
    }

    pub fn shares_of(&self, ticker: &str) -> u64 {
        self.running_shares.get(ticker).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Transaction> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn draw_follows_fixed_priority_order() {
        let mut pool = CashPool {
            previous_leftover: dec!(50),
            own_contribution: dec!(100),
            dividend_cash: dec!(25),
            sale_proceeds: dec!(10),
        };

        let draws = pool.draw(dec!(160));
        assert_eq!(
            draws,
            vec![
                (CashSource::PreviousLeftover, dec!(50)),
                (CashSource::OwnContribution, dec!(100)),
                (CashSource::DividendCash, dec!(10)),
            ]
        );
        assert_eq!(pool.dividend_cash, dec!(15));
        assert_eq!(pool.sale_proceeds, dec!(10));
        assert_eq!(pool.total(), dec!(25));
    }

    #[test]
    fn draw_conserves_value() {
        let mut pool = CashPool {
            previous_leftover: dec!(3.33),
            own_contribution: dec!(96.67),
            ..Default::default()
        };
        let before = pool.total();
        let draws = pool.draw(dec!(70));
        let drawn: Decimal = draws.iter().map(|(_, amount)| *amount).sum();
        assert_eq!(drawn, dec!(70));
        assert_eq!(pool.total(), before - dec!(70));
    }

    #[test]
    fn ledger_tracks_running_totals() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut ledger = Ledger::new();

        ledger.record(
            0,
            date,
            None,
            TransactionType::Contribution,
            dec!(100),
            None,
            0,
        );
        ledger.record(
            0,
            date,
            Some("A"),
            TransactionType::Contribution,
            dec!(-90),
            Some(dec!(9)),
            10,
        );

        assert_eq!(ledger.running_cash(), dec!(10));
        assert_eq!(ledger.shares_of("A"), 10);
        assert_eq!(ledger.rows()[1].running_share_total, 10);
        assert_eq!(ledger.rows()[1].running_cash_balance, dec!(10));
    }
}
