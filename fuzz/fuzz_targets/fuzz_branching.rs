//! Fuzz target for maximum branching on arbitrary square matrices.
//!
//! The result must always be a branching: at most one parent per node, no
//! cycles, and a parentless forced root.

#![no_main]

use arbitrary::Arbitrary;
use dbn_core::OptimumBranching;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    size: u8,
    weights: Vec<i16>,
    root: Option<u8>,
    spanning: bool,
}

fuzz_target!(|input: Input| {
    let n = (input.size % 12) as usize;
    if input.weights.is_empty() {
        return;
    }
    let matrix: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| input.weights[(i * n + j) % input.weights.len()] as f64 / 8.0)
                .collect()
        })
        .collect();
    let root = input.root.map(|r| r as usize).filter(|&r| r < n);

    let Ok(branching) = OptimumBranching::new(&matrix, root, input.spanning) else {
        return;
    };
    for node in 0..n {
        assert!(branching.ancestors(node).len() < n);
        assert!(!branching.ancestors(node).contains(&node));
    }
    if let Some(r) = root {
        assert!(branching.parent_of(r).is_none());
    }
    if input.spanning && n > 0 {
        assert_eq!(branching.edges().len(), n - 1);
    }
});
