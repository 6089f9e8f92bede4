//! Fuzz target for dataset construction from coded matrices.
//!
//! Out-of-domain codes and ragged rows must be rejected, never panic.

#![no_main]

use arbitrary::Arbitrary;
use dbn_core::{AttributeDomain, AttributeKind, Dataset};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    num_attributes: u8,
    markov_lag: u8,
    cells: Vec<Vec<Vec<i8>>>,
}

fuzz_target!(|input: Input| {
    let n = (input.num_attributes % 5) as usize;
    let lag = (input.markov_lag % 3) as usize;
    let Ok(attributes) = (0..n)
        .map(|i| AttributeDomain::with_values(format!("X{}", i), AttributeKind::Nominal, ["a", "b"]))
        .collect::<Result<Vec<_>, _>>()
    else {
        return;
    };
    let cells: Vec<Vec<Vec<i64>>> = input
        .cells
        .iter()
        .map(|t| t.iter().map(|r| r.iter().map(|&v| v as i64).collect()).collect())
        .collect();

    if let Ok(dataset) = Dataset::from_coded(attributes, lag, &cells) {
        for t in 0..dataset.num_transitions() {
            let _ = dataset.num_missing(t);
        }
        let _ = dataset.total_weight(None);
    }
});
