//! Core types: InstrumentKey, Cell

use std::fmt;

/// Unique identifier of a tradable instrument (usually an ISIN).
///
/// Used as the join key between the asset and allocation tables.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct InstrumentKey(String);

impl InstrumentKey {
    /// Create a key from any string-like value. Surrounding whitespace is trimmed.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(key.as_ref().trim().to_string())
    }

    /// The key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for InstrumentKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A single value in a raw table.
///
/// Loaded tables type cells per column: a column whose non-empty cells all
/// parse as numbers holds `Number` cells, any other column holds `Text` cells.
/// Tables built in code may mix kinds within a column.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Cell {
    /// Missing value
    #[default]
    Empty,
    /// Numeric value
    Number(f64),
    /// Textual value (e.g. a product name or a locale-formatted number)
    Text(String),
}

impl Cell {
    /// Build a text cell from raw input. Blank input becomes `Empty`.
    pub fn text(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, Cell::Text(_))
    }

    /// The numeric value, if this is a `Number` cell.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text value, if this is a `Text` cell.
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::text(s)
    }
}

/// Parse a number that may use a comma as decimal separator ("1234,56").
pub(crate) fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok()
}

/// Round to two decimal places (currency cents, percentage hundredths).
///
/// Exact halves round to even, so `0.125` becomes `0.12` and `0.135` becomes
/// `0.14`.
#[inline]
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
