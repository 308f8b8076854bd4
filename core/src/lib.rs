//! Commission engine for insurance brokerage contracts.
//!
//! Computes first-year and recurring broker commission per contract,
//! runs whole portfolios in bounded concurrent batches and rolls the
//! results up into portfolio statistics.

pub mod calculation;
pub mod calculator;
pub mod config;
pub mod demo;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod rate_registry;
pub mod rng;
pub mod stats;
pub mod store;
pub mod types;
