//! Price-series domain models.
//!
//! This module contains the core data structures for representing historical
//! price observations and the coverage descriptor the price feed reports
//! alongside each series.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Price Point
// =============================================================================

/// A single observed price for one ticker on one calendar date.
///
/// `close` is the raw closing price; `adjclose` is the split-adjusted close.
/// The engine values and trades on `close` — dividend payouts are modeled
/// explicitly by the accrual layer, so an adjusted series would double-count
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
    pub adjclose: Decimal,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: Decimal, adjclose: Decimal) -> Self {
        Self {
            date,
            close,
            adjclose,
        }
    }
}

// =============================================================================
// Price Series
// =============================================================================

/// An immutable, date-ordered price series for a single ticker.
///
/// Construction sorts observations, removes duplicate dates, and drops
/// non-positive prices, so a series is either empty or entirely usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.close > Decimal::ZERO);
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Index of the first observation on or after `date`.
    pub(crate) fn partition_at(&self, date: NaiveDate) -> usize {
        self.points.partition_point(|p| p.date < date)
    }
}

// =============================================================================
// Coverage
// =============================================================================

/// How well a series covers a requested window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageStatus {
    /// Observations span the whole requested window.
    Full,
    /// Observations cover only part of the requested window.
    Partial,
    /// No usable observation falls inside the requested window.
    #[default]
    Missing,
}

impl CoverageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Full => "FULL",
            CoverageStatus::Partial => "PARTIAL",
            CoverageStatus::Missing => "MISSING",
        }
    }

    pub fn is_usable(&self) -> bool {
        !matches!(self, CoverageStatus::Missing)
    }
}

/// Availability/quality descriptor for one ticker over a requested window.
///
/// Supplied by the price feed next to the raw series so the engine can run
/// its pre-flight data validation without touching the observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesCoverage {
    pub ticker: String,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub observations: usize,
    pub status: CoverageStatus,
}

impl SeriesCoverage {
    /// Describes `series` against the requested `[start, end]` window.
    pub fn describe(ticker: &str, series: &PriceSeries, start: NaiveDate, end: NaiveDate) -> Self {
        let first = series.first().map(|p| p.date);
        let last = series.last().map(|p| p.date);

        let status = match (first, last) {
            (Some(f), Some(l)) if l < start || f > end => CoverageStatus::Missing,
            (Some(f), Some(l)) if f <= start && l >= end => CoverageStatus::Full,
            (Some(_), Some(_)) => CoverageStatus::Partial,
            _ => CoverageStatus::Missing,
        };

        Self {
            ticker: ticker.to_string(),
            first_date: first,
            last_date: last,
            observations: series.len(),
            status,
        }
    }
}
