use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for cash amounts
pub const CASH_DECIMAL_PRECISION: u32 = 2;

/// Smallest cash amount worth a ledger row; anything below is rounding dust.
pub const CASH_DUST_THRESHOLD: Decimal = dec!(0.01);

/// Default minimum proceeds for a rebalancing sale to execute.
pub const DEFAULT_MIN_REBALANCE_VALUE: Decimal = dec!(100);

/// Default annual risk-free rate used by the Sharpe ratio.
pub const DEFAULT_RISK_FREE_RATE: Decimal = dec!(0.10);

/// Months in a year
pub const MONTHS_PER_YEAR: Decimal = dec!(12);

/// sqrt(12), fallback for annualizing monthly volatility
pub const SQRT_MONTHS_PER_YEAR_APPROX: Decimal = dec!(3.4641016151);
