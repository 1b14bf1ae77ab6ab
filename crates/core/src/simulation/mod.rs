//! Month-by-month portfolio simulation.

pub mod simulation_driver;
pub mod simulation_model;
pub mod simulation_service;

pub use simulation_driver::*;
pub use simulation_model::*;
pub use simulation_service::*;
