//! The portfolio: normalized holdings, validated targets, and a currency label.

use std::path::Path;

use crate::adapter::AssetFormatAdapter;
use crate::allocation::{self, AllocationTable};
use crate::assets::AssetTable;
use crate::error::Result;
use crate::rebalance::{Rebalance, Strategy};
use crate::summary::{self, Summary};
use crate::table::TableLoader;

/// Holdings and target allocation, loaded once and read-only afterwards.
///
/// Summaries and rebalances are recomputed on every call and never mutate the
/// portfolio. The currency is a label only: no conversion is applied, every
/// value is assumed to already be in this currency.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Portfolio {
    assets: AssetTable,
    allocation: AllocationTable,
    currency: String,
}

impl Portfolio {
    pub fn new(assets: AssetTable, allocation: AllocationTable, currency: impl Into<String>) -> Self {
        Self {
            assets,
            allocation,
            currency: currency.into(),
        }
    }

    /// Load both input files.
    ///
    /// The asset export goes through `adapter`; the allocation is validated
    /// before the portfolio is returned, so an invalid allocation never reaches
    /// the summary. Key columns are read as text in both files.
    pub fn load(
        adapter: &dyn AssetFormatAdapter,
        loader: &TableLoader,
        assets_path: &Path,
        allocation_path: &Path,
        currency: impl Into<String>,
    ) -> Result<Self> {
        let raw_assets = loader.load_keyed(assets_path, |headers| adapter.key_column(headers))?;
        let assets = adapter.normalize(raw_assets)?;
        let allocation =
            allocation::validate(loader.load_keyed(allocation_path, allocation::key_column)?)?;
        log::info!(
            "loaded {} assets ({} format) and {} allocation targets",
            assets.len(),
            adapter.name(),
            allocation.len()
        );
        Ok(Self::new(assets, allocation, currency))
    }

    pub fn assets(&self) -> &AssetTable {
        &self.assets
    }

    pub fn allocation(&self) -> &AllocationTable {
        &self.allocation
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Total current value of all holdings.
    pub fn total_value(&self) -> Result<f64> {
        self.assets.total_value()
    }

    /// Holdings joined with targets.
    pub fn summary(&self) -> Result<Summary> {
        summary::build(&self.assets, &self.allocation)
    }

    /// Compute a rebalance with the given strategy.
    pub fn rebalance(&self, strategy: Strategy) -> Result<Rebalance> {
        let summary = self.summary()?;
        let rebalance = strategy.rebalance(&summary)?;
        log::info!(
            "{strategy} rebalance: buy {:.2}, sell {:.2} {}",
            rebalance.total_buys(),
            rebalance.total_sells(),
            self.currency
        );
        Ok(rebalance)
    }
}
