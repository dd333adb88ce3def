//! Errors raised while loading, normalizing, and rebalancing a portfolio.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::rebalance::NoSellViolation;
use crate::types::InstrumentKey;

/// All errors the rebalancing engine can raise.
///
/// Every variant is fatal for the operation that produced it; the engine
/// never retries. Variants carry enough detail (column, value, instrument
/// list) for the caller to fix the offending input in one pass.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed table: {0}")]
    Csv(#[from] csv::Error),

    #[error("column mismatch: expected {expected} columns but received {actual}: {columns:?}")]
    SchemaMismatch {
        expected: usize,
        actual: usize,
        columns: Vec<String>,
    },

    #[error("row {row} has {actual} cells but the header has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("missing column {column:?}")]
    MissingColumn { column: &'static str },

    #[error("row {row} has no instrument key")]
    MissingKey { row: usize },

    #[error("duplicate instrument key {key}")]
    DuplicateKey { key: InstrumentKey },

    #[error("failed to convert column {column} to float: {value:?} is not numeric")]
    Conversion { column: &'static str, value: String },

    #[error("expected percentage for {key} is {value}, outside [0, 100]")]
    PercentageOutOfRange { key: InstrumentKey, value: f64 },

    #[error("the total sum of expected percentages is {actual}%, not 100%")]
    AllocationSum { actual: f64 },

    #[error("portfolio is empty: total current value is zero")]
    EmptyPortfolio,

    #[error(
        "no-sell rebalance cannot target 0% for an instrument that is currently held; \
         adjust the allocation for:{}",
        list_violations(.violations)
    )]
    InvalidNoSellTarget { violations: Vec<NoSellViolation> },
}

pub type Result<T> = std::result::Result<T, Error>;

fn list_violations(violations: &[NoSellViolation]) -> String {
    let mut out = String::new();
    for v in violations {
        let _ = write!(
            out,
            "\n  {} ({}): current value {:.2}, expected {}%",
            v.key,
            v.product.as_deref().unwrap_or("-"),
            v.current_value,
            v.expected_percentage,
        );
    }
    out
}
