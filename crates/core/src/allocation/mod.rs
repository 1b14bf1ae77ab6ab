pub mod allocation_model;

pub use allocation_model::*;
