//! nanofolio-rebalancer: command-line rebalancer for broker CSV exports.
//!
//! Reads a broker export and a target allocation (paths from a TOML config
//! or flags), runs them through the nanofolio engine, and renders the
//! summary or rebalance as a table, CSV, or JSON with an optional JSONL
//! audit trail.

pub mod audit;
pub mod config;
pub mod error;
pub mod report;
pub mod run;
