//! Target allocation: loading and validation.

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::table::{Table, find_column};
use crate::types::{Cell, InstrumentKey, parse_decimal};

/// The sum every valid allocation must reach, exactly.
pub const FULL_PERCENTAGE: f64 = 100.0;

pub const EXPECTED_PERCENTAGE: &str = "ExpectedPercentage";

const KEY_HEADERS: [&str; 3] = ["InstrumentKey", "Instrument Key", "ISIN"];
const PERCENTAGE_HEADERS: [&str; 2] = ["ExpectedPercentage", "Expected Percentage"];

/// Target weight for one instrument.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationRecord {
    pub key: InstrumentKey,
    /// Target weight in percent (0-100).
    pub expected_percentage: f64,
}

/// A validated allocation: unique keys, percentages summing to exactly 100.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AllocationTable {
    records: Vec<AllocationRecord>,
}

impl AllocationTable {
    /// Validate already-parsed records.
    ///
    /// Rejects duplicate keys, percentages outside [0, 100], and a total that
    /// is not exactly [`FULL_PERCENTAGE`].
    pub fn from_records(records: Vec<AllocationRecord>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for r in &records {
            if !seen.insert(&r.key) {
                return Err(Error::DuplicateKey { key: r.key.clone() });
            }
            if !(0.0..=FULL_PERCENTAGE).contains(&r.expected_percentage) {
                return Err(Error::PercentageOutOfRange {
                    key: r.key.clone(),
                    value: r.expected_percentage,
                });
            }
        }

        let actual: f64 = records.iter().map(|r| r.expected_percentage).sum();
        if actual != FULL_PERCENTAGE {
            return Err(Error::AllocationSum { actual });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[AllocationRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &AllocationRecord> {
        self.records.iter()
    }

    /// Target percentage for `key`, if the instrument is part of the allocation.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|r| r.key.as_str() == key)
            .map(|r| r.expected_percentage)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Position of the instrument key column in an allocation file.
pub fn key_column(headers: &[String]) -> Option<usize> {
    find_column(headers, &KEY_HEADERS)
}

/// Key a raw allocation table by instrument and validate it.
///
/// The table needs an instrument key column (`InstrumentKey` or `ISIN`) and an
/// `ExpectedPercentage` column; other columns are ignored. Blank percentages
/// count as zero, text percentages may use a decimal comma.
pub fn validate(raw: Table) -> Result<AllocationTable> {
    let key_col = raw.column_index(&KEY_HEADERS).ok_or(Error::MissingColumn {
        column: "InstrumentKey",
    })?;
    let pct_col = raw
        .column_index(&PERCENTAGE_HEADERS)
        .ok_or(Error::MissingColumn {
            column: EXPECTED_PERCENTAGE,
        })?;

    let mut records = Vec::with_capacity(raw.len());
    for (i, row) in raw.rows().iter().enumerate() {
        let key = match &row[key_col] {
            Cell::Text(s) => InstrumentKey::new(s),
            Cell::Number(n) => InstrumentKey::new(n.to_string()),
            // Header is line 1, so data row i sits on line i + 2.
            Cell::Empty => return Err(Error::MissingKey { row: i + 2 }),
        };
        let expected_percentage = match &row[pct_col] {
            Cell::Number(n) => *n,
            Cell::Empty => 0.0,
            Cell::Text(s) => parse_decimal(s).ok_or_else(|| Error::Conversion {
                column: EXPECTED_PERCENTAGE,
                value: s.clone(),
            })?,
        };
        records.push(AllocationRecord {
            key,
            expected_percentage,
        });
    }

    let table = AllocationTable::from_records(records)?;
    log::debug!("validated allocation of {} instruments", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableLoader;

    fn table(data: &str) -> Table {
        TableLoader::new().read(data.as_bytes()).unwrap()
    }

    #[test]
    fn accepts_exact_hundred() {
        let alloc = validate(table("ISIN,Expected Percentage\nAAA,60\nBBB,40\n")).unwrap();
        assert_eq!(alloc.len(), 2);
        assert_eq!(alloc.get("AAA"), Some(60.0));
        assert_eq!(alloc.get("CCC"), None);
    }

    #[test]
    fn rejects_ninety() {
        match validate(table("ISIN,Expected Percentage\nAAA,60\nBBB,30\n")) {
            Err(Error::AllocationSum { actual }) => assert_eq!(actual, 90.0),
            other => panic!("expected AllocationSum, got {other:?}"),
        }
    }

    #[test]
    fn rejects_off_by_one_either_side() {
        for data in [
            "InstrumentKey,ExpectedPercentage\nAAA,50\nBBB,49\n",
            "InstrumentKey,ExpectedPercentage\nAAA,50\nBBB,51\n",
        ] {
            assert!(matches!(
                validate(table(data)),
                Err(Error::AllocationSum { .. })
            ));
        }
    }

    #[test]
    fn no_tolerance() {
        let data = "ISIN,ExpectedPercentage\nAAA,50\nBBB,49.9999\n";
        assert!(matches!(
            validate(table(data)),
            Err(Error::AllocationSum { .. })
        ));
    }

    #[test]
    fn decimal_comma_percentages() {
        let data = "ISIN;Expected Percentage\nAAA;62,5\nBBB;37,5\n";
        let raw = TableLoader::new()
            .with_delimiter(b';')
            .read(data.as_bytes())
            .unwrap();
        let alloc = validate(raw).unwrap();
        assert_eq!(alloc.get("AAA"), Some(62.5));
    }

    #[test]
    fn zero_percent_is_allowed() {
        let alloc = validate(table("ISIN,Expected Percentage\nAAA,0\nBBB,100\n")).unwrap();
        assert_eq!(alloc.get("AAA"), Some(0.0));
    }

    #[test]
    fn missing_percentage_column() {
        let err = validate(table("ISIN,Weight\nAAA,100\n")).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column: EXPECTED_PERCENTAGE }));
    }

    #[test]
    fn missing_key_names_the_line() {
        let err = validate(table("ISIN,Expected Percentage\nAAA,50\n,50\n")).unwrap_err();
        assert!(matches!(err, Error::MissingKey { row: 3 }));
    }

    #[test]
    fn duplicate_key() {
        let err = validate(table("ISIN,Expected Percentage\nAAA,50\nAAA,50\n")).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { .. }));
    }

    #[test]
    fn negative_percentage() {
        let err = validate(table("ISIN,Expected Percentage\nAAA,120\nBBB,-20\n")).unwrap_err();
        assert!(matches!(err, Error::PercentageOutOfRange { .. }));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let data = "Product,ISIN,Expected Percentage\nFund A,AAA,100\n";
        assert_eq!(validate(table(data)).unwrap().len(), 1);
    }
}
