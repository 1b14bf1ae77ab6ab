//! Seasonal dividend accrual.

pub mod dividend_model;
pub mod dividend_service;

pub use dividend_model::*;
pub use dividend_service::*;
