//! mainline: main-line sector stock screener.
//!
//! Hexagonal architecture: selection logic in [`domain`], collaborator traits
//! in [`ports`], concrete implementations in [`adapters`], and the command
//! surface in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
