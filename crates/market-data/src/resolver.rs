//! Date resolution over sparse price series.
//!
//! Monthly data lags real time, so when no observation exists on the target
//! date a slightly-future observation represents the "as of" valuation better
//! than stale history. The resolver therefore prefers, in order: an exact
//! calendar-date match, the nearest later observation within the lookahead
//! window, the nearest earlier observation within the lookback window, and
//! finally the chronologically last observation.

use std::collections::HashMap;

use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::models::PriceSeries;

/// Default number of days the resolver searches forward of the target date.
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 45;

/// Default number of days the resolver searches backward of the target date.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 45;

/// Search-window policy. The defaults encode the documented business policy;
/// embedders may tighten or widen them per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverWindows {
    pub lookahead_days: i64,
    pub lookback_days: i64,
}

impl Default for ResolverWindows {
    fn default() -> Self {
        Self {
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

/// Resolves usable prices for arbitrary dates from per-ticker sparse series.
///
/// Lookups are read-only over immutable series and safe to issue from
/// multiple threads; results are memoized per `(ticker, date)`.
pub struct PriceResolver {
    series: HashMap<String, PriceSeries>,
    windows: ResolverWindows,
    windowed_cache: DashMap<(String, NaiveDate), Option<Decimal>>,
}

impl PriceResolver {
    pub fn new(series: HashMap<String, PriceSeries>) -> Self {
        Self::with_windows(series, ResolverWindows::default())
    }

    pub fn with_windows(series: HashMap<String, PriceSeries>, windows: ResolverWindows) -> Self {
        Self {
            series,
            windows,
            windowed_cache: DashMap::new(),
        }
    }

    pub fn windows(&self) -> ResolverWindows {
        self.windows
    }

    pub fn series(&self, ticker: &str) -> Option<&PriceSeries> {
        self.series.get(ticker)
    }

    /// Resolves a price for `ticker` on `date` using the full fallback chain:
    /// exact match, bounded lookahead, bounded lookback, last observation.
    ///
    /// Returns `None` only when no usable observation exists at all.
    pub fn resolve(&self, ticker: &str, date: NaiveDate) -> Option<Decimal> {
        let series = self.series.get(ticker)?;
        self.resolve_windowed(ticker, date)
            .or_else(|| series.last().map(|p| p.close))
    }

    /// Resolves a price only when one exists within the tolerance windows
    /// (exact match, lookahead, lookback). This is the availability
    /// predicate: an asset without a windowed price is skipped for the
    /// month rather than valued off arbitrarily stale history.
    pub fn resolve_windowed(&self, ticker: &str, date: NaiveDate) -> Option<Decimal> {
        let key = (ticker.to_string(), date);
        if let Some(hit) = self.windowed_cache.get(&key) {
            return *hit;
        }

        let resolved = self
            .series
            .get(ticker)
            .and_then(|series| self.resolve_in_series(series, date));
        self.windowed_cache.insert(key, resolved);
        resolved
    }

    fn resolve_in_series(&self, series: &PriceSeries, date: NaiveDate) -> Option<Decimal> {
        let points = series.points();
        if points.is_empty() {
            return None;
        }

        let idx = series.partition_at(date);

        // Exact calendar-date match wins regardless of nearby observations.
        if idx < points.len() && points[idx].date == date {
            return Some(points[idx].close);
        }

        // Nearest later observation within the lookahead window.
        if idx < points.len() {
            let later = &points[idx];
            if (later.date - date).num_days() <= self.windows.lookahead_days {
                return Some(later.close);
            }
        }

        // Nearest earlier observation within the lookback window.
        if idx > 0 {
            let earlier = &points[idx - 1];
            if (date - earlier.date).num_days() <= self.windows.lookback_days {
                return Some(earlier.close);
            }
        }

        None
    }
}
