//! Infrastructure layer: stores, database wiring, configuration.

pub mod config;
pub mod store;

#[cfg(test)]
mod integration_tests;
