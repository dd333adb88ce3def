//! Exports that already use the canonical column names.
//!
//! Columns are located by header (case, spaces and underscores ignored), so
//! they may appear in any order and extra columns are ignored. `ISIN` is
//! accepted as the instrument key header.

use crate::assets::{AMOUNT, AssetTable, CLOSING, CURRENT_VALUE, INSTRUMENT_KEY, LOCAL_VALUE, PRODUCT};
use crate::error::{Error, Result};
use crate::table::{Table, find_column};

use super::{AssetFormatAdapter, ColumnMap, key_and_coerce};

/// Adapter for tables with named canonical headers.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalAdapter;

impl CanonicalAdapter {
    fn locate(raw: &Table) -> Result<ColumnMap> {
        let find = |column: &'static str, aliases: &[&str]| {
            raw.column_index(aliases)
                .ok_or(Error::MissingColumn { column })
        };
        Ok(ColumnMap {
            product: find(PRODUCT, &[PRODUCT])?,
            key: find(INSTRUMENT_KEY, &[INSTRUMENT_KEY, "ISIN"])?,
            amount: find(AMOUNT, &[AMOUNT])?,
            closing: find(CLOSING, &[CLOSING])?,
            local_value: find(LOCAL_VALUE, &[LOCAL_VALUE])?,
            current_value: find(CURRENT_VALUE, &[CURRENT_VALUE])?,
        })
    }
}

impl AssetFormatAdapter for CanonicalAdapter {
    fn name(&self) -> &'static str {
        "canonical"
    }

    fn key_column(&self, headers: &[String]) -> Option<usize> {
        find_column(headers, &[INSTRUMENT_KEY, "ISIN"])
    }

    fn normalize(&self, raw: Table) -> Result<AssetTable> {
        let map = Self::locate(&raw)?;
        let (_, rows) = raw.into_parts();
        key_and_coerce(rows, map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableLoader;
    use crate::types::Cell;

    #[test]
    fn columns_in_any_order() {
        let data = "\
current value,ISIN,product,amount,closing,local value,notes
\"600,00\",AAA,Fund A,6,\"100,00\",600,core
\"150,50\",BBB,Fund B,1,\"150,50\",150.5,
";
        let raw = TableLoader::new().read(data.as_bytes()).unwrap();
        let assets = CanonicalAdapter.normalize(raw).unwrap();

        assert_eq!(assets.len(), 2);
        let a = assets.get("AAA").unwrap();
        assert_eq!(a.product, "Fund A");
        assert_eq!(a.current_value, Cell::Number(600.0));
        assert_eq!(a.closing, Cell::Number(100.0));
        assert_eq!(assets.total_value().unwrap(), 750.5);
    }

    #[test]
    fn numeric_keys_stay_text() {
        let data = "ISIN,Product,Amount,Closing,LocalValue,CurrentValue\n0700,Tencent,10,60,600,600\n";
        let loader = TableLoader::new();
        let raw = loader
            .read_keyed(data.as_bytes(), |headers| CanonicalAdapter.key_column(headers))
            .unwrap();
        let assets = CanonicalAdapter.normalize(raw).unwrap();
        assert!(assets.get("0700").is_some());
    }

    #[test]
    fn missing_header_is_reported() {
        let data = "Product,ISIN,Amount,Closing,LocalValue\nA,AAA,1,1,1\n";
        let raw = TableLoader::new().read(data.as_bytes()).unwrap();
        let err = CanonicalAdapter.normalize(raw).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column: CURRENT_VALUE }));
    }

    #[test]
    fn accepts_its_own_output() {
        let data = "Product,InstrumentKey,Amount,Closing,LocalValue,CurrentValue\nA,AAA,1,2,2,2\n,,,,,5\n";
        let raw = TableLoader::new().read(data.as_bytes()).unwrap();
        let once = CanonicalAdapter.normalize(raw).unwrap();
        let twice = CanonicalAdapter.normalize(once.to_table()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }
}
