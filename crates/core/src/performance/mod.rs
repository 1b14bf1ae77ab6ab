//! Derived metrics for completed simulation runs.

pub mod performance_model;
pub mod performance_service;

pub use performance_model::*;
pub use performance_service::*;
