//! Core domain types and logic.

pub mod bar;
pub mod stock;
pub mod indicator;
pub mod loader;
pub mod rule;
pub mod scan;
pub mod universe;
pub mod config_validation;
pub mod error;
