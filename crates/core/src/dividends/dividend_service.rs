//! Monthly dividend cash accrual from the seasonal payout calendar.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use log::debug;
use rust_decimal::Decimal;

use backfolio_market_data::PriceResolver;

use crate::allocation::AssetAllocationTarget;
use crate::constants::{CASH_DECIMAL_PRECISION, CASH_DUST_THRESHOLD};
use crate::rebalance::{Ledger, TransactionType};

use super::dividend_model::DividendCalendar;

pub struct DividendAccrualService {
    calendar: DividendCalendar,
}

impl Default for DividendAccrualService {
    fn default() -> Self {
        Self::new(DividendCalendar::default())
    }
}

impl DividendAccrualService {
    pub fn new(calendar: DividendCalendar) -> Self {
        Self { calendar }
    }

    /// Accrues dividend cash for `date`'s calendar month.
    ///
    /// Per held asset with positive shares and a positive trailing yield:
    /// `per_share = price x avg_yield x month_factor`, scaled by the share
    /// count. A `DIVIDEND_PAYMENT` row is written only when the amount
    /// clears the dust threshold. Returns the total cash accrued.
    pub fn accrue(
        &self,
        holdings: &BTreeMap<String, u64>,
        targets: &[AssetAllocationTarget],
        resolver: &PriceResolver,
        month_index: u32,
        date: NaiveDate,
        ledger: &mut Ledger,
    ) -> Decimal {
        let factor = self.calendar.month_factor(date.month());
        if factor.is_zero() {
            return Decimal::ZERO;
        }

        let mut total = Decimal::ZERO;
        for target in targets {
            let shares = holdings.get(&target.ticker).copied().unwrap_or(0);
            if shares == 0 || target.avg_annual_dividend_yield <= Decimal::ZERO {
                continue;
            }

            let Some(price) = resolver.resolve(&target.ticker, date) else {
                debug!(
                    "No price for {} on {}; dividend accrual skipped",
                    target.ticker, date
                );
                continue;
            };

            let per_share = price * target.avg_annual_dividend_yield * factor;
            let amount = (Decimal::from(shares) * per_share).round_dp(CASH_DECIMAL_PRECISION);
            if amount <= CASH_DUST_THRESHOLD {
                continue;
            }

            ledger.record(
                month_index,
                date,
                Some(&target.ticker),
                TransactionType::DividendPayment,
                amount,
                Some(price),
                0,
            );
            total += amount;
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backfolio_market_data::{PricePoint, PriceSeries};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolver(price: Decimal) -> PriceResolver {
        PriceResolver::new(HashMap::from([(
            "A".to_string(),
            PriceSeries::new(vec![PricePoint::new(date(2020, 1, 1), price, price)]),
        )]))
    }

    fn yielded_target(annual_yield: Decimal) -> Vec<AssetAllocationTarget> {
        vec![AssetAllocationTarget::new("A", dec!(1)).with_yield(annual_yield)]
    }

    #[test]
    fn pays_seasonal_fraction_in_payout_month() {
        let service = DividendAccrualService::default();
        let holdings = BTreeMap::from([("A".to_string(), 100_u64)]);
        let targets = yielded_target(dec!(0.12));
        let resolver = resolver(dec!(100));
        let mut ledger = Ledger::new();

        let total = service.accrue(
            &holdings,
            &targets,
            &resolver,
            2,
            date(2020, 3, 1),
            &mut ledger,
        );

        // 100 shares x 100 x 0.12 x 0.333
        assert_eq!(total, dec!(399.6));
        assert_eq!(ledger.len(), 1);
        let row = &ledger.rows()[0];
        assert_eq!(row.kind, TransactionType::DividendPayment);
        assert_eq!(row.cash_delta, dec!(399.6));
        assert_eq!(row.share_delta, 0);
    }

    #[test]
    fn non_payout_months_accrue_nothing() {
        let service = DividendAccrualService::default();
        let holdings = BTreeMap::from([("A".to_string(), 100_u64)]);
        let targets = yielded_target(dec!(0.12));
        let resolver = resolver(dec!(100));

        for month in [1, 2, 4, 5, 6, 7, 9, 11, 12] {
            let mut ledger = Ledger::new();
            let total = service.accrue(
                &holdings,
                &targets,
                &resolver,
                month - 1,
                date(2020, month, 1),
                &mut ledger,
            );
            assert_eq!(total, Decimal::ZERO, "month {}", month);
            assert!(ledger.is_empty(), "month {}", month);
        }
    }

    #[test]
    fn zero_yield_or_zero_shares_pay_nothing() {
        let service = DividendAccrualService::default();
        let resolver = resolver(dec!(100));
        let mut ledger = Ledger::new();

        let no_yield = service.accrue(
            &BTreeMap::from([("A".to_string(), 100_u64)]),
            &yielded_target(Decimal::ZERO),
            &resolver,
            2,
            date(2020, 3, 1),
            &mut ledger,
        );
        assert_eq!(no_yield, Decimal::ZERO);

        let no_shares = service.accrue(
            &BTreeMap::new(),
            &yielded_target(dec!(0.12)),
            &resolver,
            2,
            date(2020, 3, 1),
            &mut ledger,
        );
        assert_eq!(no_shares, Decimal::ZERO);
        assert!(ledger.is_empty());
    }

    #[test]
    fn dust_amounts_are_suppressed() {
        let service = DividendAccrualService::default();
        // 1 share x 0.1 x 0.003 x 0.333 rounds to 0.00
        let holdings = BTreeMap::from([("A".to_string(), 1_u64)]);
        let targets = yielded_target(dec!(0.003));
        let resolver = resolver(dec!(0.1));
        let mut ledger = Ledger::new();

        let total = service.accrue(
            &holdings,
            &targets,
            &resolver,
            2,
            date(2020, 3, 1),
            &mut ledger,
        );
        assert_eq!(total, Decimal::ZERO);
        assert!(ledger.is_empty());
    }
}
