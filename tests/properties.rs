//! Property-based tests for normalization, allocation and rebalance invariants.
//!
//! These tests use proptest to verify that key invariants hold
//! across randomly generated portfolios.

use std::collections::BTreeSet;

use nanofolio::{
    allocation, summary, AllocationRecord, AllocationTable, AssetFormatAdapter, AssetRecord,
    AssetTable, Cell, DegiroAdapter, Error, InstrumentKey, Strategy as Rebalancing, Table,
};
use proptest::prelude::*;

const DEGIRO_HEADERS: [&str; 6] = [
    "Product",
    "Symbol/ISIN",
    "Amount",
    "Closing",
    "Local value",
    "Value in EUR",
];

/// Generate a set of distinct ISIN-like keys
fn keys_strategy(max: usize) -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[A-Z]{2}[0-9]{4}", 1..max)
}

/// Generate a value in cents, rendered later with a decimal comma
fn cents_strategy() -> impl Strategy<Value = u64> {
    1u64..=100_000_000u64
}

/// Split 100 into `weights.len()` integer percentages proportional to `weights`.
fn integer_percentages(weights: &[u32]) -> Vec<f64> {
    let sum: u32 = weights.iter().sum();
    let mut pcts: Vec<u32> = weights.iter().map(|w| w * 100 / sum).collect();
    let assigned: u32 = pcts.iter().sum();
    pcts[0] += 100 - assigned;
    pcts.into_iter().map(f64::from).collect()
}

fn comma_decimal(cents: u64) -> String {
    format!("{},{:02}", cents / 100, cents % 100)
}

fn degiro_table(holdings: &[(String, u64)]) -> Table {
    let rows = holdings
        .iter()
        .map(|(key, cents)| {
            vec![
                Cell::text(&format!("Fund {key}")),
                Cell::text(key),
                Cell::Number(1.0),
                Cell::text(&comma_decimal(*cents)),
                Cell::text(&format!("EUR {}", comma_decimal(*cents))),
                Cell::text(&comma_decimal(*cents)),
            ]
        })
        .collect();
    Table::from_strs(&DEGIRO_HEADERS, rows).unwrap()
}

fn asset_table(holdings: &[(String, f64)]) -> AssetTable {
    AssetTable::from_records(
        holdings
            .iter()
            .map(|(key, value)| AssetRecord {
                key: InstrumentKey::new(key),
                product: format!("Fund {key}"),
                amount: Cell::Empty,
                closing: Cell::Empty,
                local_value: Cell::Empty,
                current_value: Cell::Number(*value),
            })
            .collect(),
    )
    .unwrap()
}

fn allocation_table(keys: &[String], weights: &[u32]) -> AllocationTable {
    AllocationTable::from_records(
        keys.iter()
            .zip(integer_percentages(weights))
            .map(|(key, pct)| AllocationRecord {
                key: InstrumentKey::new(key),
                expected_percentage: pct,
            })
            .collect(),
    )
    .unwrap()
}

/// Holdings and targets over overlapping key sets.
fn portfolio_strategy() -> impl Strategy<Value = (Vec<(String, f64)>, Vec<String>, Vec<u32>)> {
    (keys_strategy(12), keys_strategy(12)).prop_flat_map(|(held, targeted)| {
        let held: Vec<String> = held.into_iter().collect();
        let targeted: Vec<String> = targeted.into_iter().collect();
        let n_held = held.len();
        let n_targeted = targeted.len();
        (
            Just(held),
            prop::collection::vec(1.0f64..1_000_000.0, n_held),
            Just(targeted),
            prop::collection::vec(1u32..=50, n_targeted),
        )
            .prop_map(|(held, values, targeted, weights)| {
                (held.into_iter().zip(values).collect(), targeted, weights)
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // ========================================================================
    // NORMALIZATION INVARIANTS
    // ========================================================================

    /// Normalizing an already normalized table changes nothing
    #[test]
    fn normalization_is_idempotent(
        holdings in keys_strategy(20).prop_flat_map(|keys| {
            let n = keys.len();
            (Just(keys), prop::collection::vec(cents_strategy(), n))
        })
    ) {
        let holdings: Vec<(String, u64)> = holdings.0.into_iter().zip(holdings.1).collect();
        let once = DegiroAdapter.normalize(degiro_table(&holdings)).unwrap();
        let twice = DegiroAdapter.normalize(once.to_table()).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Every normalized record is keyed and its value is numeric
    #[test]
    fn normalized_records_are_keyed_and_numeric(
        holdings in keys_strategy(20).prop_flat_map(|keys| {
            let n = keys.len();
            (Just(keys), prop::collection::vec(cents_strategy(), n))
        })
    ) {
        let holdings: Vec<(String, u64)> = holdings.0.into_iter().zip(holdings.1).collect();
        let assets = DegiroAdapter.normalize(degiro_table(&holdings)).unwrap();

        prop_assert_eq!(assets.len(), holdings.len());
        prop_assert_eq!(assets.to_table().width(), 6);
        for (record, (key, cents)) in assets.iter().zip(&holdings) {
            prop_assert!(!record.key.as_str().is_empty());
            prop_assert_eq!(record.key.as_str(), key.as_str());
            let expected = *cents as f64 / 100.0;
            prop_assert!((record.value().unwrap() - expected).abs() < 1e-6);
            prop_assert!(record.closing.as_number().is_some());
        }
    }

    // ========================================================================
    // ALLOCATION INVARIANTS
    // ========================================================================

    /// Integer percentages summing to exactly 100 are accepted
    #[test]
    fn full_allocation_accepted(
        targets in keys_strategy(20).prop_flat_map(|keys| {
            let n = keys.len();
            (Just(keys), prop::collection::vec(1u32..=50, n))
        })
    ) {
        let keys: Vec<String> = targets.0.into_iter().collect();
        let pcts = integer_percentages(&targets.1);
        let rows = keys
            .iter()
            .zip(&pcts)
            .map(|(key, pct)| vec![Cell::text(key), Cell::Number(*pct)])
            .collect();
        let raw = Table::from_strs(&["ISIN", "Expected Percentage"], rows).unwrap();

        let table = allocation::validate(raw).unwrap();
        prop_assert_eq!(table.len(), keys.len());
        let total: f64 = table.iter().map(|r| r.expected_percentage).sum();
        prop_assert_eq!(total, 100.0);
    }

    /// Any allocation off by a whole point is rejected
    #[test]
    fn off_by_one_allocation_rejected(
        targets in keys_strategy(20).prop_flat_map(|keys| {
            let n = keys.len();
            (Just(keys), prop::collection::vec(1u32..=50, n))
        }),
        extra in prop_oneof![Just(-1.0f64), Just(1.0f64)],
    ) {
        let keys: Vec<String> = targets.0.into_iter().collect();
        let mut pcts = integer_percentages(&targets.1);
        // Keep the adjusted row within [0, 100]
        if pcts[0] + extra < 0.0 || pcts[0] + extra > 100.0 {
            pcts[0] -= extra;
        } else {
            pcts[0] += extra;
        }
        let rows = keys
            .iter()
            .zip(&pcts)
            .map(|(key, pct)| vec![Cell::text(key), Cell::Number(*pct)])
            .collect();
        let raw = Table::from_strs(&["ISIN", "Expected Percentage"], rows).unwrap();

        let is_sum_error = matches!(allocation::validate(raw), Err(Error::AllocationSum { .. }));
        prop_assert!(is_sum_error);
    }

    // ========================================================================
    // SUMMARY AND REBALANCE INVARIANTS
    // ========================================================================

    /// The summary has exactly one row per key in the union of both inputs
    #[test]
    fn summary_is_outer_join((holdings, targeted, weights) in portfolio_strategy()) {
        let assets = asset_table(&holdings);
        let allocation = allocation_table(&targeted, &weights);
        let summary = summary::build(&assets, &allocation).unwrap();

        let union: BTreeSet<&str> = holdings
            .iter()
            .map(|(k, _)| k.as_str())
            .chain(targeted.iter().map(String::as_str))
            .collect();
        let keys: Vec<&str> = summary.iter().map(|r| r.key.as_str()).collect();
        prop_assert_eq!(keys, union.into_iter().collect::<Vec<_>>());

        for row in summary.iter() {
            let held = assets.get(row.key.as_str()).is_some();
            prop_assert_eq!(row.product.is_some(), held);
            if !held {
                prop_assert_eq!(row.current_value, 0.0);
            }
            prop_assert_eq!(
                row.expected_percentage,
                allocation.get(row.key.as_str()).unwrap_or(0.0)
            );
        }
    }

    /// Sell rebalance moves money around without adding any, up to rounding
    #[test]
    fn sell_rebalance_is_neutral((holdings, targeted, weights) in portfolio_strategy()) {
        let summary = summary::build(
            &asset_table(&holdings),
            &allocation_table(&targeted, &weights),
        )
        .unwrap();
        let rebalance = Rebalancing::Sell.rebalance(&summary).unwrap();

        let tolerance = 0.005 * rebalance.len() as f64 + 1e-6;
        prop_assert!(
            rebalance.net_movement().abs() <= tolerance,
            "net movement {} exceeds {}", rebalance.net_movement(), tolerance
        );
        for row in rebalance.iter() {
            prop_assert!((row.current_value + row.movement - row.expected_value).abs() < 1e-6);
        }
    }

    /// No-sell rebalance never sells when every held instrument is targeted
    #[test]
    fn no_sell_rebalance_only_buys(
        held in keys_strategy(12).prop_flat_map(|keys| {
            let n = keys.len();
            (
                Just(keys),
                prop::collection::vec(1.0f64..1_000_000.0, n),
                prop::collection::vec(1u32..=50, n),
            )
        })
    ) {
        let keys: Vec<String> = held.0.into_iter().collect();
        let holdings: Vec<(String, f64)> = keys.iter().cloned().zip(held.1).collect();
        let summary = summary::build(
            &asset_table(&holdings),
            &allocation_table(&keys, &held.2),
        )
        .unwrap();
        let rebalance = Rebalancing::NoSell.rebalance(&summary).unwrap();

        let anchor = rebalance.anchor().unwrap();
        let anchor_row = rebalance.get(anchor.as_str()).unwrap();
        prop_assert!(anchor_row.movement.abs() < 0.01);
        for row in rebalance.iter() {
            prop_assert!(row.movement >= -0.01, "{} sells {}", row.key, row.movement);
        }
        let slack = 0.01 * rebalance.len() as f64;
        prop_assert!(rebalance.total_expected_value() >= rebalance.total_current_value() - slack);
    }
}
