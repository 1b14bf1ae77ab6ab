//! Dividend seasonality calendar.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Seasonal payout calendar: calendar month (1-12) to the share of the
/// annual yield paid in that month. Months not present pay nothing.
///
/// The factors encode business policy and must sum to exactly 1 so a full
/// year always distributes the full annual yield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendCalendar {
    factors: BTreeMap<u32, Decimal>,
}

impl Default for DividendCalendar {
    /// Payouts land in March, August, and October; the final payout carries
    /// the rounding remainder so the year's factors sum to exactly 1.0.
    fn default() -> Self {
        Self {
            factors: BTreeMap::from([
                (3, dec!(0.333)),
                (8, dec!(0.333)),
                (10, dec!(0.334)),
            ]),
        }
    }
}

impl DividendCalendar {
    pub fn new(factors: BTreeMap<u32, Decimal>) -> Result<Self> {
        for (&month, &factor) in &factors {
            if !(1..=12).contains(&month) {
                return Err(ValidationError::InvalidInput(format!(
                    "Dividend calendar month {} is out of range 1-12",
                    month
                ))
                .into());
            }
            if factor <= Decimal::ZERO {
                return Err(ValidationError::InvalidInput(format!(
                    "Dividend factor for month {} must be positive, got {}",
                    month, factor
                ))
                .into());
            }
        }

        let total: Decimal = factors.values().sum();
        if !factors.is_empty() && total != Decimal::ONE {
            return Err(ValidationError::InvalidInput(format!(
                "Dividend calendar factors must sum to 1, got {}",
                total
            ))
            .into());
        }

        Ok(Self { factors })
    }

    /// Share of the annual yield paid in `month`, zero outside payout months.
    pub fn month_factor(&self, month: u32) -> Decimal {
        self.factors.get(&month).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn payout_months(&self) -> impl Iterator<Item = u32> + '_ {
        self.factors.keys().copied()
    }
}
