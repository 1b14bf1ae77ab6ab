//! Backfolio Core - portfolio backtesting simulation engine.
//!
//! Given a target asset allocation, a monthly contribution schedule, and
//! historical price series, this crate reconstructs the month-by-month
//! evolution of a portfolio under periodic rebalancing, integer-share
//! purchase constraints, and seasonal dividend payouts — even when price
//! data is incomplete.
//!
//! The crate is I/O-free: price data arrives through the provider trait of
//! `backfolio-market-data`, and results are plain in-memory structures the
//! embedding application persists however it likes.

pub mod allocation;
pub mod constants;
pub mod dividends;
pub mod errors;
pub mod performance;
pub mod rebalance;
pub mod simulation;

// Re-export the common surface
pub use rebalance::{CashPool, CashSource, Ledger, Transaction, TransactionType};
pub use simulation::{
    MonthlySnapshot, RebalanceFrequency, SimulationConfig, SimulationPolicy, SimulationResult,
    SimulationService, SimulationServiceTrait,
};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
