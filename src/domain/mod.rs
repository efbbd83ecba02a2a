//! Core domain types and selection logic.

pub mod market;
pub mod history;
pub mod series;
pub mod signal;
pub mod sector;
pub mod scoring;
pub mod selection;
pub mod universe;
pub mod config_validation;
pub mod error;
