//! Broker export adapters.
//!
//! Each supported export format implements [`AssetFormatAdapter`], turning a
//! raw [`Table`] into a normalized [`AssetTable`]. The rest of the engine only
//! depends on the trait.
//!
//! - **Degiro** ([`DegiroAdapter`]): six positional columns, decimal commas
//! - **Canonical** ([`CanonicalAdapter`]): named columns in any order

pub mod canonical;
pub mod degiro;

pub use canonical::CanonicalAdapter;
pub use degiro::DegiroAdapter;

use crate::assets::{AssetRecord, AssetTable};
use crate::error::{Error, Result};
use crate::table::Table;
use crate::types::{Cell, InstrumentKey, parse_decimal};

/// Normalizes one broker's asset export into the canonical keyed schema.
pub trait AssetFormatAdapter {
    /// Short identifier used in config files and logs (e.g. `"degiro"`).
    fn name(&self) -> &'static str;

    /// Position of the instrument key column, given the raw headers.
    ///
    /// The loader keeps this column as text so numeric-looking keys survive
    /// unchanged.
    fn key_column(&self, headers: &[String]) -> Option<usize>;

    /// Rename/validate columns, drop unkeyed rows, key the table, and coerce
    /// numeric columns.
    fn normalize(&self, raw: Table) -> Result<AssetTable>;
}

/// Column positions of the canonical fields inside a raw row.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ColumnMap {
    pub product: usize,
    pub key: usize,
    pub amount: usize,
    pub closing: usize,
    pub local_value: usize,
    pub current_value: usize,
}

impl ColumnMap {
    /// The canonical positional layout.
    pub const POSITIONAL: ColumnMap = ColumnMap {
        product: 0,
        key: 1,
        amount: 2,
        closing: 3,
        local_value: 4,
        current_value: 5,
    };
}

/// Shared tail of every adapter: drop unkeyed rows, key the table, then
/// convert the `Closing` and `CurrentValue` columns.
pub(crate) fn key_and_coerce(rows: Vec<Vec<Cell>>, map: ColumnMap) -> Result<AssetTable> {
    let total = rows.len();
    let records: Vec<AssetRecord> = rows
        .into_iter()
        .filter_map(|mut row| {
            let key = key_of(&row[map.key])?;
            Some(AssetRecord {
                key,
                product: row[map.product].to_string(),
                amount: std::mem::take(&mut row[map.amount]),
                closing: std::mem::take(&mut row[map.closing]),
                local_value: std::mem::take(&mut row[map.local_value]),
                current_value: std::mem::take(&mut row[map.current_value]),
            })
        })
        .collect();

    let dropped = total - records.len();
    if dropped > 0 {
        log::debug!("dropped {dropped} rows without an instrument key");
    }

    let mut table = AssetTable::from_records(records)?;
    coerce_decimal_column(table.records_mut(), crate::assets::CLOSING, |r| {
        &mut r.closing
    })?;
    coerce_decimal_column(table.records_mut(), crate::assets::CURRENT_VALUE, |r| {
        &mut r.current_value
    })?;
    Ok(table)
}

fn key_of(cell: &Cell) -> Option<InstrumentKey> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => Some(InstrumentKey::new(s)),
        Cell::Number(n) => Some(InstrumentKey::new(n.to_string())),
    }
}

/// Convert a column of decimal-comma strings to numbers.
///
/// Only applies when every cell in the column is text. A column that is
/// already numeric, or that mixes text with numbers or blanks, is left
/// untouched. Returns whether the column was converted.
pub(crate) fn coerce_decimal_column(
    records: &mut [AssetRecord],
    column: &'static str,
    field: impl Fn(&mut AssetRecord) -> &mut Cell,
) -> Result<bool> {
    if !records.iter_mut().all(|r| field(r).is_text()) {
        return Ok(false);
    }

    for record in records.iter_mut() {
        let cell = field(record);
        let parsed = match cell.as_text() {
            Some(s) => parse_decimal(s).ok_or_else(|| Error::Conversion {
                column,
                value: s.to_string(),
            })?,
            None => continue,
        };
        *cell = Cell::Number(parsed);
    }

    log::debug!("converted column {column} from decimal-comma text");
    Ok(true)
}
