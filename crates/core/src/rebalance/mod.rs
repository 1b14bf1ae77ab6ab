//! Rebalancing module - cash attribution, the transaction ledger, and the
//! integer-share rebalancing engine.

pub mod rebalance_model;
pub mod rebalance_service;

pub use rebalance_model::*;
pub use rebalance_service::*;
