//! Normalized, keyed table of held assets.

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::table::Table;
use crate::types::{Cell, InstrumentKey};

/// Canonical asset column names, in positional order.
pub const PRODUCT: &str = "Product";
pub const INSTRUMENT_KEY: &str = "InstrumentKey";
pub const AMOUNT: &str = "Amount";
pub const CLOSING: &str = "Closing";
pub const LOCAL_VALUE: &str = "LocalValue";
pub const CURRENT_VALUE: &str = "CurrentValue";

/// The canonical asset schema.
pub const ASSET_COLUMNS: [&str; 6] = [
    PRODUCT,
    INSTRUMENT_KEY,
    AMOUNT,
    CLOSING,
    LOCAL_VALUE,
    CURRENT_VALUE,
];

/// One held instrument after normalization.
///
/// Numeric fields stay as [`Cell`]s: normalization only converts columns that
/// were entirely textual, so a column mixing kinds survives unconverted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetRecord {
    pub key: InstrumentKey,
    pub product: String,
    pub amount: Cell,
    pub closing: Cell,
    pub local_value: Cell,
    pub current_value: Cell,
}

impl AssetRecord {
    /// Current value in portfolio currency.
    ///
    /// An empty cell counts as zero. A text cell means the column was never
    /// converted and fails with [`Error::Conversion`].
    pub fn value(&self) -> Result<f64> {
        match &self.current_value {
            Cell::Number(n) => Ok(*n),
            Cell::Empty => Ok(0.0),
            Cell::Text(s) => Err(Error::Conversion {
                column: CURRENT_VALUE,
                value: s.clone(),
            }),
        }
    }

    fn into_row(self) -> Vec<Cell> {
        vec![
            Cell::text(&self.product),
            Cell::Text(self.key.as_str().to_string()),
            self.amount,
            self.closing,
            self.local_value,
            self.current_value,
        ]
    }
}

/// Assets keyed by instrument, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetTable {
    records: Vec<AssetRecord>,
}

impl AssetTable {
    /// Build a keyed table. Duplicate keys are rejected.
    pub fn from_records(records: Vec<AssetRecord>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for r in &records {
            if !seen.insert(&r.key) {
                return Err(Error::DuplicateKey { key: r.key.clone() });
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [AssetRecord] {
        &mut self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.iter()
    }

    pub fn get(&self, key: &str) -> Option<&AssetRecord> {
        self.records.iter().find(|r| r.key.as_str() == key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of current values (empty cells count as zero).
    pub fn total_value(&self) -> Result<f64> {
        self.records.iter().map(AssetRecord::value).sum()
    }

    /// Convert back to a raw table in the canonical positional layout.
    ///
    /// Normalizing the result again yields an identical table.
    pub fn to_table(&self) -> Table {
        let headers = ASSET_COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = self.records.iter().cloned().map(AssetRecord::into_row).collect();
        // Width is fixed by construction.
        Table::new(headers, rows).unwrap_or_default()
    }
}

impl<'a> IntoIterator for &'a AssetTable {
    type Item = &'a AssetRecord;
    type IntoIter = std::slice::Iter<'a, AssetRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
