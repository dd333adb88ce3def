//! Degiro portfolio export ("Portfolio.csv").
//!
//! The export has six positional columns whose header text depends on the
//! account language and currency (`"Value in EUR"`, `"Wert in EUR"`, ...), so
//! headers are replaced by position rather than matched by name. Cash rows
//! carry no ISIN and are dropped.

use crate::assets::{ASSET_COLUMNS, AssetTable};
use crate::error::{Error, Result};
use crate::table::Table;

use super::{AssetFormatAdapter, ColumnMap, key_and_coerce};

/// Adapter for Degiro portfolio exports.
#[derive(Clone, Copy, Debug, Default)]
pub struct DegiroAdapter;

impl AssetFormatAdapter for DegiroAdapter {
    fn name(&self) -> &'static str {
        "degiro"
    }

    fn key_column(&self, headers: &[String]) -> Option<usize> {
        let key = ColumnMap::POSITIONAL.key;
        (key < headers.len()).then_some(key)
    }

    fn normalize(&self, raw: Table) -> Result<AssetTable> {
        if raw.width() != ASSET_COLUMNS.len() {
            return Err(Error::SchemaMismatch {
                expected: ASSET_COLUMNS.len(),
                actual: raw.width(),
                columns: raw.headers().to_vec(),
            });
        }
        let (_, rows) = raw.into_parts();
        key_and_coerce(rows, ColumnMap::POSITIONAL)
    }
}
