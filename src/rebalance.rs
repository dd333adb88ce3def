//! Rebalancing strategies: sell-allowed and no-sell.
//!
//! Both start from a [`Summary`] and produce a [`Rebalance`]: per instrument,
//! the value it should have and the signed movement (buy > 0, sell < 0) to get
//! there.
//!
//! - **Sell**: redistribute the current total according to the targets.
//! - **NoSell**: only add money. The most over-weighted instrument (the
//!   anchor) keeps its value and every other instrument is topped up to match.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::summary::{Summary, SummaryRow};
use crate::types::{InstrumentKey, round2};

/// Which rebalancing strategy to apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Strategy {
    /// Buy and sell so every instrument hits its target weight.
    #[default]
    Sell,
    /// Only buy; holdings are never reduced.
    NoSell,
}

impl Strategy {
    /// Apply this strategy to a summary.
    pub fn rebalance(self, summary: &Summary) -> Result<Rebalance> {
        match self {
            Strategy::Sell => Ok(rebalance_sell(summary)),
            Strategy::NoSell => rebalance_no_sell(summary),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Sell => "sell",
            Strategy::NoSell => "no-sell",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sell" => Ok(Strategy::Sell),
            "no-sell" | "nosell" | "no_sell" => Ok(Strategy::NoSell),
            other => Err(format!("unknown strategy {other:?} (expected sell or no-sell)")),
        }
    }
}

/// One instrument's rebalance instruction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceRow {
    pub key: InstrumentKey,
    pub product: Option<String>,
    pub current_value: f64,
    pub expected_value: f64,
    pub current_percentage: f64,
    pub expected_percentage: f64,
    /// `expected_value - current_value`: positive = buy, negative = sell.
    pub movement: f64,
}

impl RebalanceRow {
    fn new(row: &SummaryRow, expected_value: f64) -> Self {
        Self {
            key: row.key.clone(),
            product: row.product.clone(),
            current_value: row.current_value,
            expected_value,
            current_percentage: row.current_percentage,
            expected_percentage: row.expected_percentage,
            movement: expected_value - row.current_value,
        }
    }
}

/// The computed rebalance, rows ordered by instrument key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rebalance {
    strategy: Strategy,
    rows: Vec<RebalanceRow>,
    total_current_value: f64,
    anchor: Option<InstrumentKey>,
}

impl Rebalance {
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn rows(&self) -> &[RebalanceRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &RebalanceRow> {
        self.rows.iter()
    }

    pub fn get(&self, key: &str) -> Option<&RebalanceRow> {
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

    /// Portfolio value before rebalancing.
    pub fn total_current_value(&self) -> f64 {
        self.total_current_value
    }

    /// Portfolio value after applying every movement.
    pub fn total_expected_value(&self) -> f64 {
        self.rows.iter().map(|r| r.expected_value).sum()
    }

    /// Sum of positive movements.
    pub fn total_buys(&self) -> f64 {
        self.rows
            .iter()
            .filter(|r| r.movement > 0.0)
            .fold(0.0, |acc, r| acc + r.movement)
    }

    /// Sum of negative movements, as a positive amount.
    pub fn total_sells(&self) -> f64 {
        self.rows
            .iter()
            .filter(|r| r.movement < 0.0)
            .fold(0.0, |acc, r| acc - r.movement)
    }

    /// Net new money required (zero for a sell rebalance, up to rounding).
    pub fn net_movement(&self) -> f64 {
        self.rows.iter().map(|r| r.movement).sum()
    }

    /// The reference instrument of a no-sell rebalance.
    pub fn anchor(&self) -> Option<&InstrumentKey> {
        self.anchor.as_ref()
    }
}

/// A held instrument targeted at 0%, which a no-sell rebalance cannot close.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoSellViolation {
    pub key: InstrumentKey,
    pub product: Option<String>,
    pub current_value: f64,
    pub expected_percentage: f64,
}

/// Redistribute the current total according to the target weights.
///
/// `expected_value = round(total / 100 * expected_percentage, 2)`.
pub fn rebalance_sell(summary: &Summary) -> Rebalance {
    let total = summary.total_current_value();
    let rows = summary
        .iter()
        .map(|row| RebalanceRow::new(row, round2(total / 100.0 * row.expected_percentage)))
        .collect();

    Rebalance {
        strategy: Strategy::Sell,
        rows,
        total_current_value: total,
        anchor: None,
    }
}

/// Rebalance by adding money only.
///
/// The anchor is the row with the highest `current_percentage /
/// expected_percentage`, compared on unrounded values (`current_value /
/// expected_percentage`) so that rounded percentages cannot pick an anchor
/// that forces a sell. Rows targeted at 0% are skipped, ties go to the first
/// key. Every row is valued at `expected_percentage * anchor.current_value /
/// anchor.expected_percentage`, so the anchor's movement is zero and all others
/// are non-negative.
///
/// Fails with [`Error::InvalidNoSellTarget`] listing every held instrument
/// targeted at 0%.
pub fn rebalance_no_sell(summary: &Summary) -> Result<Rebalance> {
    let violations: Vec<NoSellViolation> = summary
        .iter()
        .filter(|r| r.expected_percentage == 0.0 && r.current_value != 0.0)
        .map(|r| NoSellViolation {
            key: r.key.clone(),
            product: r.product.clone(),
            current_value: r.current_value,
            expected_percentage: r.expected_percentage,
        })
        .collect();
    if !violations.is_empty() {
        return Err(Error::InvalidNoSellTarget { violations });
    }

    let anchor = find_anchor(summary).ok_or_else(|| Error::AllocationSum {
        actual: summary.iter().map(|r| r.expected_percentage).sum(),
    })?;
    log::debug!(
        "no-sell anchor {} ({:.2}% held vs {:.2}% target)",
        anchor.key,
        anchor.current_percentage,
        anchor.expected_percentage
    );

    let rows = summary
        .iter()
        .map(|row| {
            let expected = round2(
                row.expected_percentage * anchor.current_value / anchor.expected_percentage,
            );
            RebalanceRow::new(row, expected)
        })
        .collect();

    Ok(Rebalance {
        strategy: Strategy::NoSell,
        rows,
        total_current_value: summary.total_current_value(),
        anchor: Some(anchor.key.clone()),
    })
}

fn find_anchor(summary: &Summary) -> Option<&SummaryRow> {
    let mut best: Option<(&SummaryRow, f64)> = None;
    for row in summary.iter().filter(|r| r.expected_percentage > 0.0) {
        let ratio = row.current_value / row.expected_percentage;
        match best {
            Some((_, top)) if ratio <= top => {}
            _ => best = Some((row, ratio)),
        }
    }
    best.map(|(row, _)| row)
}
