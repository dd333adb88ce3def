//! # nanofolio
//!
//! A deterministic portfolio rebalancing engine for broker CSV exports.
//!
//! ## Pipeline
//!
//! 1. **Load**: [`TableLoader`] reads a delimited file into a raw [`Table`]
//! 2. **Normalize**: an [`AssetFormatAdapter`] turns the broker export into a
//!    keyed [`AssetTable`] (canonical columns, decimal commas converted)
//! 3. **Validate**: [`allocation::validate`] keys the target allocation and
//!    checks that it sums to exactly 100%
//! 4. **Summarize**: [`summary::build`] outer-joins holdings with targets
//! 5. **Rebalance**: [`Strategy::Sell`] or [`Strategy::NoSell`]
//!
//! ## Quick Start
//!
//! ```
//! use nanofolio::{allocation, DegiroAdapter, AssetFormatAdapter, Portfolio, Strategy, TableLoader};
//!
//! let export = "\
//! Product,Symbol/ISIN,Amount,Closing,Local value,Value in EUR
//! Fund A,AAA,6,\"100,00\",EUR 600.00,\"600,00\"
//! ";
//! let targets = "ISIN,Expected Percentage\nAAA,50\nBBB,50\n";
//!
//! let loader = TableLoader::new();
//! let assets = DegiroAdapter.normalize(loader.read(export.as_bytes())?)?;
//! let allocation = allocation::validate(loader.read(targets.as_bytes())?)?;
//! let portfolio = Portfolio::new(assets, allocation, "EUR");
//!
//! // Selling allowed: move 300 from AAA to BBB
//! let sell = portfolio.rebalance(Strategy::Sell)?;
//! assert_eq!(sell.get("AAA").unwrap().movement, -300.0);
//! assert_eq!(sell.get("BBB").unwrap().movement, 300.0);
//!
//! // No selling: keep AAA, add 600 to BBB
//! let no_sell = portfolio.rebalance(Strategy::NoSell)?;
//! assert_eq!(no_sell.get("AAA").unwrap().movement, 0.0);
//! assert_eq!(no_sell.get("BBB").unwrap().movement, 600.0);
//! # Ok::<(), nanofolio::Error>(())
//! ```
//!
//! ## Strategies
//!
//! | Strategy | Expected value | Movements |
//! |----------|----------------|-----------|
//! | **Sell** | `total / 100 * expected%` | Buys and sells, net zero |
//! | **NoSell** | `expected% * anchor_value / anchor_expected%` | Buys only |
//!
//! The no-sell anchor is the instrument with the highest
//! `current% / expected%`. A held instrument targeted at 0% cannot be closed
//! without selling, so the no-sell strategy rejects it:
//!
//! ```
//! use nanofolio::{Error, InstrumentKey, Strategy, Summary, SummaryRow};
//!
//! let summary = Summary::from_rows(vec![
//!     SummaryRow {
//!         key: InstrumentKey::new("CCC"),
//!         product: Some("Fund C".into()),
//!         current_value: 100.0,
//!         current_percentage: 100.0,
//!         expected_percentage: 0.0,
//!     },
//!     SummaryRow {
//!         key: InstrumentKey::new("DDD"),
//!         product: None,
//!         current_value: 0.0,
//!         current_percentage: 0.0,
//!         expected_percentage: 100.0,
//!     },
//! ]);
//!
//! match Strategy::NoSell.rebalance(&summary) {
//!     Err(Error::InvalidNoSellTarget { violations }) => {
//!         assert_eq!(violations.len(), 1);
//!         assert_eq!(violations[0].key.as_str(), "CCC");
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! ## Currency
//!
//! The portfolio currency is a label. Values are never converted; every input
//! value must already be expressed in that currency.

pub mod adapter;
pub mod allocation;
pub mod assets;
mod error;
pub mod portfolio;
pub mod rebalance;
pub mod summary;
pub mod table;
mod types;

// Re-export public API
pub use adapter::{AssetFormatAdapter, CanonicalAdapter, DegiroAdapter};
pub use allocation::{AllocationRecord, AllocationTable, FULL_PERCENTAGE};
pub use assets::{AssetRecord, AssetTable};
pub use error::{Error, Result};
pub use portfolio::Portfolio;
pub use rebalance::{NoSellViolation, Rebalance, RebalanceRow, Strategy};
pub use summary::{Summary, SummaryRow};
pub use table::{Table, TableLoader};
pub use types::{Cell, InstrumentKey};
