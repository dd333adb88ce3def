//! Rendering: terminal tables, CSV, and JSON.

use std::fmt;
use std::io::{self, Write};

use nanofolio::{Portfolio, Rebalance, RebalanceRow, Summary};
use serde::Serialize;

use crate::error::Result;

/// CSV header of a rebalance export.
pub const REBALANCE_COLUMNS: [&str; 7] = [
    "InstrumentKey",
    "Product",
    "CurrentValue",
    "ExpectedValue",
    "CurrentPercentage",
    "ExpectedPercentage",
    "Movement",
];

const PRODUCT_WIDTH: usize = 32;

/// Clip a product name to the table column.
fn clip(product: Option<&str>) -> String {
    let product = product.unwrap_or("-");
    if product.chars().count() <= PRODUCT_WIDTH {
        product.to_string()
    } else {
        let mut clipped: String = product.chars().take(PRODUCT_WIDTH - 1).collect();
        clipped.push('~');
        clipped
    }
}

/// One-paragraph overview printed by `check`.
pub struct CheckReport<'a> {
    pub portfolio: &'a Portfolio,
    pub total_value: f64,
}

impl fmt::Display for CheckReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let allocation = self.portfolio.allocation();
        let unheld = allocation
            .iter()
            .filter(|t| self.portfolio.assets().get(t.key.as_str()).is_none())
            .count();
        let untargeted = self
            .portfolio
            .assets()
            .iter()
            .filter(|a| allocation.get(a.key.as_str()).is_none())
            .count();

        writeln!(f, "INPUTS OK:")?;
        writeln!(f, "  Holdings:           {}", self.portfolio.assets().len())?;
        writeln!(f, "  Targets:            {}", allocation.len())?;
        writeln!(f, "  Targeted, not held: {unheld}")?;
        writeln!(f, "  Held, not targeted: {untargeted}")?;
        writeln!(
            f,
            "  Total value:        {:.2} {}",
            self.total_value,
            self.portfolio.currency()
        )?;
        Ok(())
    }
}

/// Terminal table of a summary.
pub struct SummaryTable<'a> {
    pub summary: &'a Summary,
    pub currency: &'a str,
}

impl fmt::Display for SummaryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SUMMARY ({}):", self.currency)?;
        writeln!(
            f,
            "  {:14} {:32} {:>14} {:>9} {:>9}",
            "Instrument", "Product", "Value", "Current%", "Target%"
        )?;
        for row in self.summary.iter() {
            writeln!(
                f,
                "  {:14} {:32} {:>14.2} {:>8.2}% {:>8.2}%",
                row.key.as_str(),
                clip(row.product.as_deref()),
                row.current_value,
                row.current_percentage,
                row.expected_percentage,
            )?;
        }
        writeln!(
            f,
            "\n  Total: {:.2} {}",
            self.summary.total_current_value(),
            self.currency
        )?;
        Ok(())
    }
}

/// Terminal table of a rebalance.
pub struct RebalanceTable<'a> {
    pub rebalance: &'a Rebalance,
    pub currency: &'a str,
}

impl fmt::Display for RebalanceTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rebalance = self.rebalance;
        writeln!(f, "REBALANCE ({}, {}):", rebalance.strategy(), self.currency)?;
        writeln!(
            f,
            "  {:14} {:32} {:>14} {:>14} {:>9} {:>9} {:>14}",
            "Instrument", "Product", "Current", "Expected", "Current%", "Target%", "Movement"
        )?;
        for row in rebalance.iter() {
            writeln!(
                f,
                "  {:14} {:32} {:>14.2} {:>14.2} {:>8.2}% {:>8.2}% {:>+14.2}",
                row.key.as_str(),
                clip(row.product.as_deref()),
                row.current_value,
                row.expected_value,
                row.current_percentage,
                row.expected_percentage,
                row.movement,
            )?;
        }

        writeln!(f)?;
        if let Some(anchor) = rebalance.anchor() {
            writeln!(f, "  Anchor:   {anchor}")?;
        }
        writeln!(
            f,
            "  Current:  {:.2} {}",
            rebalance.total_current_value(),
            self.currency
        )?;
        writeln!(
            f,
            "  Expected: {:.2} {}",
            rebalance.total_expected_value(),
            self.currency
        )?;
        writeln!(f, "  Buys:     {:.2} {}", rebalance.total_buys(), self.currency)?;
        writeln!(f, "  Sells:    {:.2} {}", rebalance.total_sells(), self.currency)?;
        writeln!(f, "  Net:      {:+.2} {}", rebalance.net_movement(), self.currency)?;
        Ok(())
    }
}

/// Write a rebalance as CSV with a [`REBALANCE_COLUMNS`] header.
pub fn write_csv<W: io::Write>(rebalance: &Rebalance, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(REBALANCE_COLUMNS)?;
    for row in rebalance.iter() {
        csv.write_record([
            row.key.as_str().to_string(),
            row.product.clone().unwrap_or_default(),
            format!("{:.2}", row.current_value),
            format!("{:.2}", row.expected_value),
            format!("{:.2}", row.current_percentage),
            format!("{:.2}", row.expected_percentage),
            format!("{:.2}", row.movement),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    strategy: &'static str,
    currency: &'a str,
    anchor: Option<&'a str>,
    total_current_value: f64,
    total_expected_value: f64,
    total_buys: f64,
    total_sells: f64,
    net_movement: f64,
    rows: &'a [RebalanceRow],
}

/// Write a rebalance as pretty-printed JSON: the rows plus totals.
pub fn write_json<W: io::Write>(rebalance: &Rebalance, currency: &str, mut writer: W) -> Result<()> {
    let report = JsonReport {
        strategy: rebalance.strategy().as_str(),
        currency,
        anchor: rebalance.anchor().map(|k| k.as_str()),
        total_current_value: rebalance.total_current_value(),
        total_expected_value: rebalance.total_expected_value(),
        total_buys: rebalance.total_buys(),
        total_sells: rebalance.total_sells(),
        net_movement: rebalance.net_movement(),
        rows: rebalance.rows(),
    };
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writeln!(writer)?;
    Ok(())
}
