//! Target-allocation domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One asset's place in the target portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAllocationTarget {
    pub ticker: String,
    /// Target fraction of the portfolio, in (0, 1].
    pub target_allocation: Decimal,
    /// Trailing average annual dividend yield, as a fraction of price.
    #[serde(default)]
    pub avg_annual_dividend_yield: Decimal,
}

impl AssetAllocationTarget {
    pub fn new(ticker: &str, target_allocation: Decimal) -> Self {
        Self {
            ticker: ticker.to_string(),
            target_allocation,
            avg_annual_dividend_yield: Decimal::ZERO,
        }
    }

    pub fn with_yield(mut self, avg_annual_dividend_yield: Decimal) -> Self {
        self.avg_annual_dividend_yield = avg_annual_dividend_yield;
        self
    }
}

/// Renormalizes `targets` over the subset for which `is_available` holds, so
/// the usable fractions again sum to 1. Unavailable assets are excluded and
/// the remaining ones scaled up proportionally; an empty usable subset yields
/// an empty result.
pub fn renormalize_targets<F>(
    targets: &[AssetAllocationTarget],
    mut is_available: F,
) -> Vec<(&AssetAllocationTarget, Decimal)>
where
    F: FnMut(&str) -> bool,
{
    let usable: Vec<&AssetAllocationTarget> = targets
        .iter()
        .filter(|t| t.target_allocation > Decimal::ZERO && is_available(&t.ticker))
        .collect();

    let total: Decimal = usable.iter().map(|t| t.target_allocation).sum();
    if total.is_zero() {
        return Vec::new();
    }

    usable
        .into_iter()
        .map(|t| (t, t.target_allocation / total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn renormalizes_over_available_subset() {
        let targets = vec![
            AssetAllocationTarget::new("A", dec!(0.6)),
            AssetAllocationTarget::new("B", dec!(0.3)),
            AssetAllocationTarget::new("C", dec!(0.1)),
        ];

        let weighted = renormalize_targets(&targets, |ticker| ticker != "B");
        assert_eq!(weighted.len(), 2);

        let total: Decimal = weighted.iter().map(|(_, f)| *f).sum();
        assert_eq!(total, Decimal::ONE);

        // 0.6 / 0.7 and 0.1 / 0.7, scaled up proportionally.
        assert_eq!(weighted[0].0.ticker, "A");
        assert!(weighted[0].1 > dec!(0.85) && weighted[0].1 < dec!(0.86));
    }

    #[test]
    fn all_available_keeps_original_fractions() {
        let targets = vec![
            AssetAllocationTarget::new("A", dec!(0.5)),
            AssetAllocationTarget::new("B", dec!(0.5)),
        ];
        let weighted = renormalize_targets(&targets, |_| true);
        assert_eq!(weighted[0].1, dec!(0.5));
        assert_eq!(weighted[1].1, dec!(0.5));
    }

    #[test]
    fn empty_usable_subset_yields_empty() {
        let targets = vec![AssetAllocationTarget::new("A", dec!(1))];
        assert!(renormalize_targets(&targets, |_| false).is_empty());
    }
}
