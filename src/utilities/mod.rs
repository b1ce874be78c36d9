//! Shared utilities: error types and registry configuration.

pub mod config;
pub mod errors;
