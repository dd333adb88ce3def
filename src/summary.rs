//! Holdings vs. targets: the full outer join both strategies start from.

use std::collections::BTreeMap;

use crate::allocation::AllocationTable;
use crate::assets::AssetTable;
use crate::error::{Error, Result};
use crate::types::{InstrumentKey, round2};

/// One instrument's current and target weight.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryRow {
    pub key: InstrumentKey,
    /// Product name; `None` for instruments only present in the allocation.
    pub product: Option<String>,
    /// Current value in portfolio currency (0 if not held).
    pub current_value: f64,
    /// Share of the total current value, in percent, rounded to 2 decimals.
    pub current_percentage: f64,
    /// Target weight in percent (0 if not in the allocation).
    pub expected_percentage: f64,
}

/// Every instrument from either input, ordered by key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    rows: Vec<SummaryRow>,
    total_current_value: f64,
}

impl Summary {
    /// Assemble a summary from precomputed rows.
    ///
    /// Rows are sorted by key and the total is recomputed from them; the
    /// percentages are taken as given.
    pub fn from_rows(mut rows: Vec<SummaryRow>) -> Self {
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        let total_current_value = rows.iter().map(|r| r.current_value).sum();
        Self {
            rows,
            total_current_value,
        }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter()
    }

    pub fn get(&self, key: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.key.as_str() == key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of current values across all rows.
    #[inline]
    pub fn total_current_value(&self) -> f64 {
        self.total_current_value
    }
}

/// Join assets with the allocation and compute current weights.
///
/// Instruments present on one side only still get a row, with the other side
/// defaulted to zero. Fails with [`Error::EmptyPortfolio`] when nothing is held.
pub fn build(assets: &AssetTable, allocation: &AllocationTable) -> Result<Summary> {
    let mut joined: BTreeMap<&InstrumentKey, SummaryRow> = BTreeMap::new();

    for asset in assets {
        joined.insert(
            &asset.key,
            SummaryRow {
                key: asset.key.clone(),
                product: Some(asset.product.clone()),
                current_value: asset.value()?,
                current_percentage: 0.0,
                expected_percentage: 0.0,
            },
        );
    }

    for target in allocation.iter() {
        joined
            .entry(&target.key)
            .or_insert_with(|| SummaryRow {
                key: target.key.clone(),
                product: None,
                current_value: 0.0,
                current_percentage: 0.0,
                expected_percentage: 0.0,
            })
            .expected_percentage = target.expected_percentage;
    }

    let total: f64 = joined.values().map(|r| r.current_value).sum();
    if total == 0.0 {
        return Err(Error::EmptyPortfolio);
    }

    let rows: Vec<SummaryRow> = joined
        .into_values()
        .map(|mut row| {
            row.current_percentage = round2(row.current_value / total * 100.0);
            row
        })
        .collect();

    log::debug!(
        "summary: {} instruments, total current value {total:.2}",
        rows.len()
    );

    Ok(Summary {
        rows,
        total_current_value: total,
    })
}
