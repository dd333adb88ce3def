//! In-memory tables and the delimited-file loader.
//!
//! A [`Table`] is the raw, untyped form of an input file: a header row plus
//! rows of [`Cell`]s. Adapters and validators turn it into keyed, typed tables.

use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{Error, Result};
use crate::types::Cell;

/// A rectangular table of cells with a header row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, checking that every row matches the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(Error::RaggedRow {
                    row: i + 2,
                    expected: headers.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    /// Build a table from string slices (handy for fixtures).
    pub fn from_strs(headers: &[&str], rows: Vec<Vec<Cell>>) -> Result<Self> {
        Self::new(headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.headers, self.rows)
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Number of data rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column whose normalized header matches one of `names`.
    ///
    /// Matching ignores case, spaces, and underscores, so `"Expected Percentage"`
    /// matches `"ExpectedPercentage"` and `"expected_percentage"`.
    pub fn column_index(&self, names: &[&str]) -> Option<usize> {
        find_column(&self.headers, names)
    }

    /// Iterate over the cells of one column.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }
}

/// Header lookup behind [`Table::column_index`], usable before a table exists.
pub fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = normalize_header(h);
        names.iter().any(|n| normalize_header(n) == h)
    })
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Reads delimited text files (header row required) into [`Table`]s.
///
/// Columns are typed the way a dataframe reader infers dtypes: if every
/// non-empty cell in a column parses as a number the whole column becomes
/// numeric, otherwise every non-empty cell stays text. Locale-formatted
/// numbers such as `"1234,56"` therefore load as text; converting them is
/// the adapter's job.
///
/// The keyed variants ([`load_keyed`](Self::load_keyed),
/// [`read_keyed`](Self::read_keyed)) exempt the instrument key column from
/// inference, so a key such as `"0700"` keeps its leading zero even when every
/// key in the file is numeric.
#[derive(Clone, Copy, Debug)]
pub struct TableLoader {
    delimiter: u8,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl TableLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different field delimiter (e.g. `b';'` for European exports).
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Load a table from a file.
    ///
    /// A missing file is reported as [`Error::NotFound`] so callers can tell it
    /// apart from malformed content.
    pub fn load(&self, path: &Path) -> Result<Table> {
        self.load_keyed(path, |_| None)
    }

    /// Load a table from a file, keeping the column chosen by `key_column`
    /// as text.
    pub fn load_keyed(
        &self,
        path: &Path,
        key_column: impl FnOnce(&[String]) -> Option<usize>,
    ) -> Result<Table> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let table = self.read_keyed(file, key_column)?;
        log::debug!(
            "loaded {} rows x {} columns from {}",
            table.len(),
            table.width(),
            path.display()
        );
        Ok(table)
    }

    /// Read a table from any reader.
    pub fn read<R: io::Read>(&self, reader: R) -> Result<Table> {
        self.read_keyed(reader, |_| None)
    }

    /// Read a table from any reader, keeping the column chosen by
    /// `key_column` as text.
    pub fn read_keyed<R: io::Read>(
        &self,
        reader: R,
        key_column: impl FnOnce(&[String]) -> Option<usize>,
    ) -> Result<Table> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut raw_rows: Vec<StringRecord> = Vec::new();
        for record in reader.records() {
            raw_rows.push(record?);
        }

        let key_col = key_column(&headers);
        let numeric: Vec<bool> = (0..headers.len())
            .map(|col| {
                Some(col) != key_col
                    && raw_rows.iter().all(|r| {
                        let v = r.get(col).unwrap_or("").trim();
                        v.is_empty() || v.parse::<f64>().is_ok()
                    })
            })
            .collect();

        let rows = raw_rows
            .iter()
            .map(|record| {
                (0..headers.len())
                    .map(|col| {
                        let raw = record.get(col).unwrap_or("").trim();
                        match (raw.is_empty(), numeric[col]) {
                            (true, _) => Cell::Empty,
                            (false, true) => raw.parse::<f64>().map_or(Cell::Empty, Cell::Number),
                            (false, false) => Cell::Text(raw.to_string()),
                        }
                    })
                    .collect()
            })
            .collect();

        Table::new(headers, rows)
    }
}

/// Load a comma-delimited table from `path`.
pub fn load(path: &Path) -> Result<Table> {
    TableLoader::new().load(path)
}
