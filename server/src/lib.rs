//! walletd Server
//!
//! REST surface, configuration, and metrics for the wallet ledger service.
//! The consistency core lives in `walletd-ledger`; this crate only decodes
//! requests, maps errors to statuses, and wires the process together.

pub mod config;
pub mod metrics;
pub mod rest;

pub use config::ServerConfig;
pub use metrics::{Metrics, SharedMetrics};
